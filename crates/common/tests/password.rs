//! Integration tests for password strength scoring

use common::password::{
    detect_patterns, estimate_entropy, evaluate_password_strength, PasswordPattern, StrengthLevel,
    MIN_PASSWORD_SCORE,
};

#[test]
fn test_documented_examples() {
    let weak = evaluate_password_strength("aaaaaaaaaaaa");
    assert!(weak.score <= 1);
    assert!(!weak.meets_minimum);

    let strong = evaluate_password_strength("Tr0ub4dor&3xyz!");
    assert_eq!(strong.score, 3);
    assert_eq!(strong.level, StrengthLevel::Strong);
    assert!(strong.meets_minimum);
    assert_eq!(strong.feedback, vec!["Avoid sequential characters (abc, 123)".to_string()]);
}

#[test]
fn test_entropy_monotonic_for_fixed_composition() {
    for base in ["a", "aZ", "aZ9", "aZ9#"] {
        let mut previous = estimate_entropy("");
        assert_eq!(previous, 0);
        for n in 1..=32 {
            let entropy = estimate_entropy(&base.repeat(n));
            assert!(entropy >= previous, "{} x{}", base, n);
            previous = entropy;
        }
    }
}

#[test]
fn test_levels_follow_score() {
    for password in ["", "abc", "abcdefgh", "Correct-Horse-42", "xQ7!mK2#vL9$pR4&"] {
        let result = evaluate_password_strength(password);
        assert!(result.score <= 4);
        assert_eq!(result.level, StrengthLevel::from_score(result.score));
        assert_eq!(result.meets_minimum, result.score >= MIN_PASSWORD_SCORE);
    }
}

#[test]
fn test_pattern_penalty_counts_each_category_once() {
    assert_eq!(
        detect_patterns("aaa-bbb-123-456"),
        vec![PasswordPattern::Repeated, PasswordPattern::Sequential]
    );

    // same composition and length, one with a run and one without
    let clean = evaluate_password_strength("Kq8#Lz2!Wm5$");
    let run = evaluate_password_strength("Kq8#Lz2!Wabc");
    assert!(run.score < clean.score);
}

#[test]
fn test_feedback_for_short_lowercase() {
    let result = evaluate_password_strength("hello");
    assert_eq!(result.level, StrengthLevel::VeryWeak);
    assert!(result.feedback.contains(&"Use at least 12 characters".to_string()));
    assert!(result
        .feedback
        .contains(&"Mix uppercase and lowercase letters".to_string()));
    assert!(result.feedback.contains(&"Add numbers".to_string()));
    assert!(result.feedback.contains(&"Add symbols".to_string()));
}
