use std::fmt;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use super::{SealedCredential, SecureStorage};
use crate::crypto::{
    check_support, derive_password_key, generate_salt, CryptoSupport, Sealed, Secret, SecretError,
    SALT_SIZE,
};

#[derive(Debug, thiserror::Error)]
pub enum LocalStorageError {
    #[error("local storage error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("secure storage used before init")]
    NotInitialized,
    #[error("secure random source unavailable: {0}")]
    Unavailable(String),
    #[error("invalid salt size, expected {SALT_SIZE}, got {0}")]
    InvalidSalt(usize),
    #[error("credential was sealed under a different root key")]
    SaltMismatch,
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid password or corrupted data")]
    Decrypt,
    #[error("credential is not valid utf-8")]
    InvalidUtf8,
    #[error("secret error: {0}")]
    Secret(SecretError),
}

impl From<SecretError> for LocalStorageError {
    fn from(e: SecretError) -> Self {
        match e {
            SecretError::Decrypt => LocalStorageError::Decrypt,
            other => LocalStorageError::Secret(other),
        }
    }
}

enum RootKeySource {
    /// Random key generated on init, lives as long as the process
    Device,
    /// Derived from a passphrase, reproducible given the salt
    Passphrase {
        passphrase: Zeroizing<String>,
        salt: [u8; SALT_SIZE],
    },
}

/// The reference [`SecureStorage`] provider
///
/// # Examples
///
/// ```ignore
/// let storage = LocalSecureStorage::with_passphrase("a long passphrase")?;
/// storage.init().await?;
/// let sealed = storage.encrypt_credential("api-token").await?;
/// ```
pub struct LocalSecureStorage {
    source: RootKeySource,
    root: OnceCell<Secret<Sealed>>,
}

impl fmt::Debug for LocalSecureStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.source {
            RootKeySource::Device => "device",
            RootKeySource::Passphrase { .. } => "passphrase",
        };
        f.debug_struct("LocalSecureStorage")
            .field("mode", &mode)
            .field("initialized", &self.root.initialized())
            .finish()
    }
}

impl LocalSecureStorage {
    /// A provider with a random device-local root key
    pub fn device() -> Self {
        Self {
            source: RootKeySource::Device,
            root: OnceCell::new(),
        }
    }

    /// A provider whose root key is derived from `passphrase` under a new salt
    pub fn with_passphrase(passphrase: &str) -> Result<Self, LocalStorageError> {
        let salt = generate_salt()?;
        Self::with_passphrase_and_salt(passphrase, &salt)
    }

    /// Reopen a passphrase provider with the salt reported by [`Self::salt`]
    pub fn with_passphrase_and_salt(
        passphrase: &str,
        salt: &[u8],
    ) -> Result<Self, LocalStorageError> {
        let salt: [u8; SALT_SIZE] = salt
            .try_into()
            .map_err(|_| LocalStorageError::InvalidSalt(salt.len()))?;
        Ok(Self {
            source: RootKeySource::Passphrase {
                passphrase: Zeroizing::new(passphrase.to_string()),
                salt,
            },
            root: OnceCell::new(),
        })
    }

    /// base64 salt of a passphrase provider, empty for device mode
    pub fn salt(&self) -> String {
        match &self.source {
            RootKeySource::Device => String::new(),
            RootKeySource::Passphrase { salt, .. } => STANDARD.encode(salt),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.root.initialized()
    }

    fn root(&self) -> Result<&Secret<Sealed>, LocalStorageError> {
        self.root.get().ok_or(LocalStorageError::NotInitialized)
    }
}

#[async_trait]
impl SecureStorage for LocalSecureStorage {
    type Error = LocalStorageError;

    async fn init(&self) -> Result<(), Self::Error> {
        if let CryptoSupport::Unavailable(reason) = check_support() {
            return Err(LocalStorageError::Unavailable(reason));
        }

        self.root
            .get_or_try_init(|| async {
                let key = match &self.source {
                    RootKeySource::Device => Secret::<Sealed>::generate()?,
                    RootKeySource::Passphrase { passphrase, salt } => {
                        derive_password_key(passphrase, salt).await?
                    }
                };
                tracing::debug!("secure storage root key ready");
                Ok::<_, LocalStorageError>(key)
            })
            .await?;
        Ok(())
    }

    async fn encrypt_credential(&self, plaintext: &str) -> Result<SealedCredential, Self::Error> {
        let sealed = self.root()?.encrypt(plaintext.as_bytes())?;
        Ok(SealedCredential {
            encrypted: STANDARD.encode(&sealed.data),
            iv: STANDARD.encode(sealed.nonce),
            salt: self.salt(),
        })
    }

    async fn decrypt_credential(
        &self,
        encrypted: &str,
        iv: &str,
        salt: &str,
    ) -> Result<String, Self::Error> {
        let root = self.root()?;
        if !salt.is_empty() && salt != self.salt() {
            return Err(LocalStorageError::SaltMismatch);
        }

        let data = STANDARD.decode(encrypted)?;
        let nonce = STANDARD.decode(iv)?;
        let plaintext = root.decrypt(&data, &nonce)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| LocalStorageError::InvalidUtf8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_use_before_init() {
        let storage = LocalSecureStorage::device();
        assert!(!storage.is_initialized());
        assert!(matches!(
            storage.encrypt_credential("x").await,
            Err(LocalStorageError::NotInitialized)
        ));
        assert!(matches!(
            storage.decrypt_credential("", "", "").await,
            Err(LocalStorageError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_device_mode_roundtrip() {
        let storage = LocalSecureStorage::device();
        storage.init().await.unwrap();
        storage.init().await.unwrap();

        let sealed = storage.encrypt_credential("token-123").await.unwrap();
        assert!(sealed.salt.is_empty());
        let plaintext = storage
            .decrypt_credential(&sealed.encrypted, &sealed.iv, &sealed.salt)
            .await
            .unwrap();
        assert_eq!(plaintext, "token-123");
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let storage = LocalSecureStorage::device();
        storage.init().await.unwrap();
        let sealed = storage.encrypt_credential("stable").await.unwrap();

        // a second init must not rotate the root key
        storage.init().await.unwrap();
        let plaintext = storage
            .decrypt_credential(&sealed.encrypted, &sealed.iv, "")
            .await
            .unwrap();
        assert_eq!(plaintext, "stable");
    }

    #[tokio::test]
    async fn test_passphrase_mode_reopens() {
        let storage = LocalSecureStorage::with_passphrase("correct horse battery").unwrap();
        storage.init().await.unwrap();
        let sealed = storage.encrypt_credential("secret").await.unwrap();
        assert!(!sealed.salt.is_empty());

        let salt = STANDARD.decode(&sealed.salt).unwrap();
        let reopened =
            LocalSecureStorage::with_passphrase_and_salt("correct horse battery", &salt).unwrap();
        reopened.init().await.unwrap();
        let plaintext = reopened
            .decrypt_credential(&sealed.encrypted, &sealed.iv, &sealed.salt)
            .await
            .unwrap();
        assert_eq!(plaintext, "secret");

        let wrong = LocalSecureStorage::with_passphrase_and_salt("wrong horse", &salt).unwrap();
        wrong.init().await.unwrap();
        assert!(matches!(
            wrong
                .decrypt_credential(&sealed.encrypted, &sealed.iv, &sealed.salt)
                .await,
            Err(LocalStorageError::Decrypt)
        ));
    }

    #[tokio::test]
    async fn test_salt_mismatch() {
        let storage = LocalSecureStorage::with_passphrase("passphrase").unwrap();
        storage.init().await.unwrap();
        let sealed = storage.encrypt_credential("secret").await.unwrap();

        let other_salt = STANDARD.encode([9u8; SALT_SIZE]);
        assert!(matches!(
            storage
                .decrypt_credential(&sealed.encrypted, &sealed.iv, &other_salt)
                .await,
            Err(LocalStorageError::SaltMismatch)
        ));
    }

    #[test]
    fn test_invalid_salt_size() {
        assert!(matches!(
            LocalSecureStorage::with_passphrase_and_salt("pw", &[0u8; 4]),
            Err(LocalStorageError::InvalidSalt(4))
        ));
    }
}
