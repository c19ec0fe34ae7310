//! Password strength evaluation
//!
//! Used to gate sharing a sync room: a room password is the only thing
//!  standing between a relay and the room key, so weak ones are refused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest score a password must reach to be accepted
pub const MIN_PASSWORD_SCORE: u8 = 2;
/// Length at which a password earns the length point
pub const RECOMMENDED_LENGTH: usize = 12;

const LOWER_POOL: u32 = 26;
const UPPER_POOL: u32 = 26;
const DIGIT_POOL: u32 = 10;
const SYMBOL_POOL: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => StrengthLevel::VeryWeak,
            1 => StrengthLevel::Weak,
            2 => StrengthLevel::Fair,
            3 => StrengthLevel::Strong,
            _ => StrengthLevel::VeryStrong,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "very-weak",
            StrengthLevel::Weak => "weak",
            StrengthLevel::Fair => "fair",
            StrengthLevel::Strong => "strong",
            StrengthLevel::VeryStrong => "very-strong",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weakness found in the structure of a password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordPattern {
    /// Three or more identical characters in a row
    Repeated,
    /// Three consecutive code points, ascending or descending
    Sequential,
}

impl PasswordPattern {
    fn feedback(&self) -> &'static str {
        match self {
            PasswordPattern::Repeated => "Avoid repeated characters",
            PasswordPattern::Sequential => "Avoid sequential characters (abc, 123)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrengthResult {
    /// 0 to 4
    pub score: u8,
    pub level: StrengthLevel,
    pub meets_minimum: bool,
    pub feedback: Vec<String>,
    /// Estimated bits of entropy
    pub entropy: u32,
}

#[derive(Debug, Default)]
struct Composition {
    lower: bool,
    upper: bool,
    digit: bool,
    symbol: bool,
}

impl Composition {
    fn of(password: &str) -> Self {
        let mut composition = Composition::default();
        for c in password.chars() {
            if c.is_ascii_lowercase() {
                composition.lower = true;
            } else if c.is_ascii_uppercase() {
                composition.upper = true;
            } else if c.is_ascii_digit() {
                composition.digit = true;
            } else {
                composition.symbol = true;
            }
        }
        composition
    }

    fn pool_size(&self) -> u32 {
        [
            (self.lower, LOWER_POOL),
            (self.upper, UPPER_POOL),
            (self.digit, DIGIT_POOL),
            (self.symbol, SYMBOL_POOL),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, size)| size)
        .sum()
    }
}

/// `floor(length * log2(pool))` with the pool built from the character classes present
pub fn estimate_entropy(password: &str) -> u32 {
    let pool = Composition::of(password).pool_size();
    if pool == 0 {
        return 0;
    }
    let length = password.chars().count() as f64;
    (length * f64::from(pool).log2()).floor() as u32
}

/// Distinct weak patterns present in `password`
pub fn detect_patterns(password: &str) -> Vec<PasswordPattern> {
    let chars: Vec<u32> = password.chars().map(u32::from).collect();
    let mut patterns = Vec::new();

    if chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]) {
        patterns.push(PasswordPattern::Repeated);
    }

    let sequential = chars.windows(3).any(|w| {
        let ascending = w[1].checked_sub(w[0]) == Some(1) && w[2].checked_sub(w[1]) == Some(1);
        let descending = w[0].checked_sub(w[1]) == Some(1) && w[1].checked_sub(w[2]) == Some(1);
        ascending || descending
    });
    if sequential {
        patterns.push(PasswordPattern::Sequential);
    }

    patterns
}

/// Score a password from 0 (very weak) to 4 (very strong)
///
/// Points: +1 for 12 or more characters, +1 for mixed case, +0.5 for a digit,
///  +0.5 for a symbol and +1 at 50 bits of entropy. Each kind of weak pattern
///  found costs a point.
pub fn evaluate_password_strength(password: &str) -> PasswordStrengthResult {
    let composition = Composition::of(password);
    let entropy = estimate_entropy(password);
    let patterns = detect_patterns(password);
    let mut feedback = Vec::new();
    let mut raw = 0.0_f64;

    if password.chars().count() >= RECOMMENDED_LENGTH {
        raw += 1.0;
    } else {
        feedback.push(format!("Use at least {} characters", RECOMMENDED_LENGTH));
    }

    if composition.lower && composition.upper {
        raw += 1.0;
    } else {
        feedback.push("Mix uppercase and lowercase letters".to_string());
    }

    if composition.digit {
        raw += 0.5;
    } else {
        feedback.push("Add numbers".to_string());
    }

    if composition.symbol {
        raw += 0.5;
    } else {
        feedback.push("Add symbols".to_string());
    }

    if entropy >= 50 {
        raw += 1.0;
    }

    for pattern in &patterns {
        raw -= 1.0;
        feedback.push(pattern.feedback().to_string());
    }

    let score = raw.round().clamp(0.0, 4.0) as u8;

    PasswordStrengthResult {
        score,
        level: StrengthLevel::from_score(score),
        meets_minimum: score >= MIN_PASSWORD_SCORE,
        feedback,
        entropy,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_entropy_empty() {
        assert_eq!(estimate_entropy(""), 0);
    }

    #[test]
    fn test_entropy_values() {
        // 8 * log2(26) = 37.6
        assert_eq!(estimate_entropy("abcdefgh"), 37);
        // 4 * log2(94) = 26.2
        assert_eq!(estimate_entropy("aA1!"), 26);
        // symbol class covers non-ascii too
        assert_eq!(estimate_entropy("é"), 5);
    }

    #[test]
    fn test_entropy_counts_chars_not_bytes() {
        assert_eq!(estimate_entropy("ééé"), estimate_entropy("!!!"));
    }

    #[test]
    fn test_entropy_non_decreasing_in_length() {
        let mut previous = 0;
        for n in 1..40 {
            let entropy = estimate_entropy(&"aB3$".repeat(n));
            assert!(entropy >= previous);
            previous = entropy;
        }
    }

    #[test]
    fn test_patterns() {
        assert_eq!(detect_patterns("xaaay"), vec![PasswordPattern::Repeated]);
        assert_eq!(detect_patterns("x123y"), vec![PasswordPattern::Sequential]);
        assert_eq!(detect_patterns("zyx"), vec![PasswordPattern::Sequential]);
        assert_eq!(
            detect_patterns("aaabc"),
            vec![PasswordPattern::Repeated, PasswordPattern::Sequential]
        );
        assert!(detect_patterns("a1b2c3").is_empty());
        assert!(detect_patterns("aa").is_empty());
    }

    #[test]
    fn test_repeated_characters_are_weak() {
        let result = evaluate_password_strength("aaaaaaaaaaaa");
        assert!(result.score <= 1);
        assert!(!result.meets_minimum);
        assert!(result
            .feedback
            .iter()
            .any(|f| f == "Avoid repeated characters"));
    }

    #[test]
    fn test_strong_password() {
        // "xyz" is a sequential run and costs a point
        let result = evaluate_password_strength("Tr0ub4dor&3xyz!");
        assert_eq!(result.score, 3);
        assert_eq!(result.level, StrengthLevel::Strong);
        assert!(result.meets_minimum);

        let result = evaluate_password_strength("Tr0ub4dor&3xqz!");
        assert_eq!(result.score, 4);
        assert_eq!(result.level, StrengthLevel::VeryStrong);
    }

    #[test]
    fn test_long_patterned_passwords_are_rejected() {
        for password in ["a".repeat(18), "correcthorsebatteryyy".to_string()] {
            let result = evaluate_password_strength(&password);
            assert!(result.entropy >= 80, "{}", password);
            assert_eq!(result.score, 1, "{}", password);
            assert!(!result.meets_minimum, "{}", password);
        }
    }

    #[test]
    fn test_empty_password() {
        let result = evaluate_password_strength("");
        assert_eq!(result.score, 0);
        assert_eq!(result.level, StrengthLevel::VeryWeak);
        assert_eq!(result.entropy, 0);
        assert!(!result.meets_minimum);
    }

    #[test]
    fn test_level_serialization() {
        let result = evaluate_password_strength("short");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["meetsMinimum"].is_boolean());
        assert_eq!(
            serde_json::to_value(StrengthLevel::VeryStrong).unwrap(),
            "very-strong"
        );
        assert_eq!(StrengthLevel::VeryWeak.to_string(), "very-weak");
    }
}
