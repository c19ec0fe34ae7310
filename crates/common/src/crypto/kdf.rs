//! Password based key derivation (PBKDF2-HMAC-SHA256)
//!
//! Deliberately expensive. The async entry point runs the derivation on the
//! blocking pool so it never stalls a runtime worker.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::secret::{Sealed, Secret, SecretError, SECRET_SIZE};

/// Iteration count for every password derived key
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Size of a PBKDF2 salt in bytes
pub const SALT_SIZE: usize = 16;

/// Generate a fresh random salt
pub fn generate_salt() -> Result<[u8; SALT_SIZE], SecretError> {
    super::random_bytes::<SALT_SIZE>()
}

/// Derive an AES-256 key from a password and salt, synchronously
pub fn derive_key(password: &[u8], salt: &[u8]) -> Secret<Sealed> {
    let mut out = Zeroizing::new([0u8; SECRET_SIZE]);
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, out.as_mut());
    Secret::from_bytes(*out)
}

/// Derive an AES-256 key from a password and salt on the blocking pool
pub async fn derive_password_key(password: &str, salt: &[u8]) -> Result<Secret<Sealed>, SecretError> {
    let password = Zeroizing::new(password.as_bytes().to_vec());
    let salt = salt.to_vec();
    tracing::debug!("deriving password key ({} iterations)", PBKDF2_ITERATIONS);
    let key = tokio::task::spawn_blocking(move || derive_key(&password, &salt))
        .await
        .map_err(|e| anyhow::anyhow!("key derivation task failed: {}", e))?;
    Ok(key)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_same_inputs_same_key() {
        let salt = generate_salt().unwrap();
        let a = derive_password_key("correct horse", &salt).await.unwrap();
        let b = derive_password_key("correct horse", &salt).await.unwrap();

        let encrypted = a.encrypt(b"payload").unwrap();
        let decrypted = b.decrypt(&encrypted.data, &encrypted.nonce).unwrap();
        assert_eq!(decrypted.as_slice(), b"payload");
    }

    #[tokio::test]
    async fn test_different_salt_different_key() {
        let a = derive_password_key("correct horse", &[1u8; SALT_SIZE]).await.unwrap();
        let b = derive_password_key("correct horse", &[2u8; SALT_SIZE]).await.unwrap();

        let encrypted = a.encrypt(b"payload").unwrap();
        assert!(b.decrypt(&encrypted.data, &encrypted.nonce).is_err());
    }

    #[test]
    fn test_salts_are_random() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
