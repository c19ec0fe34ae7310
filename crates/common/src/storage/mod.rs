/**
 * Root key providers.
 *  A provider owns the key that protects data at rest
 *  on this device and exposes nothing but
 *  credential level encrypt/decrypt.
 */
mod local;

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use local::{LocalSecureStorage, LocalStorageError};

/// A credential encrypted by a [`SecureStorage`] provider
///
/// All fields are base64. `salt` is whatever the provider needs to find its
///  root key again and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedCredential {
    pub encrypted: String,
    pub iv: String,
    pub salt: String,
}

#[async_trait]
pub trait SecureStorage: Send + Sync + Debug + 'static {
    type Error: std::error::Error + Display + Send + Sync + 'static;

    /// Make the root key available. Safe to call more than once.
    async fn init(&self) -> Result<(), Self::Error>;

    /// Encrypt a credential under the root key with a fresh nonce
    async fn encrypt_credential(&self, plaintext: &str) -> Result<SealedCredential, Self::Error>;

    /// Decrypt a credential produced by [`SecureStorage::encrypt_credential`]
    async fn decrypt_credential(
        &self,
        encrypted: &str,
        iv: &str,
        salt: &str,
    ) -> Result<String, Self::Error>;
}
