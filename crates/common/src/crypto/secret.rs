//! Content encryption using AES-256-GCM
//!
//! A `Secret` is a 256-bit AES-GCM key. Every call to [`Secret::encrypt`] draws
//! a fresh random 96-bit nonce from the OS, so the same plaintext never
//! produces the same ciphertext twice and a nonce is never reused under a key.
//!
//! The ciphertext keeps the 16-byte authentication tag appended, so values
//! written here can be read by any other AES-GCM implementation given the key
//! and nonce.

use std::fmt;
use std::marker::PhantomData;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

/// Size of an AES-256 key in bytes
pub const SECRET_SIZE: usize = 32;
/// Size of an AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid secret size, expected {SECRET_SIZE}, got {0}")]
    InvalidSize(usize),
    #[error("invalid nonce size, expected {NONCE_SIZE}, got {0}")]
    InvalidNonce(usize),
    #[error("secure random source unavailable")]
    Rng,
    /// Tag mismatch. A wrong key and tampered data are indistinguishable.
    #[error("invalid password or corrupted data")]
    Decrypt,
}

mod private {
    pub trait Token {}
}

/// Marks what a [`Secret`] is allowed to do with its key bytes
pub trait Capability: private::Token + Send + Sync + 'static {
    const NAME: &'static str;
}

/// The key may be exported raw, e.g. to wrap it for a peer
pub enum Exportable {}

/// The key never leaves the process
pub enum Sealed {}

impl private::Token for Exportable {}
impl private::Token for Sealed {}

impl Capability for Exportable {
    const NAME: &'static str = "exportable";
}

impl Capability for Sealed {
    const NAME: &'static str = "sealed";
}

/// AES-GCM output together with the nonce it was produced under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    /// Encrypted bytes with the authentication tag appended
    pub data: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

/// A 256-bit AES-GCM key, zeroized on drop
///
/// # Examples
///
/// ```ignore
/// let key = Secret::<Exportable>::generate()?;
/// let sealed = key.encrypt(b"sensitive data")?;
/// let plaintext = key.decrypt(&sealed.data, &sealed.nonce)?;
/// assert_eq!(&plaintext[..], b"sensitive data");
/// ```
pub struct Secret<C: Capability = Sealed> {
    bytes: Zeroizing<[u8; SECRET_SIZE]>,
    _capability: PhantomData<fn() -> C>,
}

impl<C: Capability> Clone for Secret<C> {
    fn clone(&self) -> Self {
        Self::from_bytes(*self.bytes)
    }
}

impl<C: Capability> fmt::Debug for Secret<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret<{}>(..)", C::NAME)
    }
}

impl<C: Capability> Secret<C> {
    pub(crate) fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
            _capability: PhantomData,
        }
    }

    pub(crate) fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidSize(data.len()));
        }
        let mut buff = [0u8; SECRET_SIZE];
        buff.copy_from_slice(data);
        let secret = Self::from_bytes(buff);
        buff.iter_mut().for_each(|b| *b = 0);
        Ok(secret)
    }

    /// Generate a new random key using the OS random source
    pub fn generate() -> Result<Self, SecretError> {
        let bytes = Zeroizing::new(super::random_bytes::<SECRET_SIZE>()?);
        Ok(Self::from_bytes(*bytes))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.bytes[..]))
    }

    /// Encrypt `plaintext` under a freshly generated nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext, SecretError> {
        let nonce_bytes = super::random_bytes::<NONCE_SIZE>()?;
        let nonce = Nonce::<U12>::from_slice(&nonce_bytes);
        let data = self
            .cipher()
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        Ok(Ciphertext {
            data,
            nonce: nonce_bytes,
        })
    }

    /// Decrypt and authenticate `data` produced under `nonce`
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidNonce`] for a nonce that is not 12 bytes and
    /// [`SecretError::Decrypt`] when the tag does not verify.
    pub fn decrypt(&self, data: &[u8], nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>, SecretError> {
        if nonce.len() != NONCE_SIZE {
            return Err(SecretError::InvalidNonce(nonce.len()));
        }
        let nonce = Nonce::<U12>::from_slice(nonce);
        let plaintext = self
            .cipher()
            .decrypt(nonce, data)
            .map_err(|_| SecretError::Decrypt)?;
        Ok(Zeroizing::new(plaintext))
    }
}

impl Secret<Exportable> {
    /// Import raw key bytes, e.g. a workspace key unwrapped from a peer
    pub fn import_raw(data: &[u8]) -> Result<Self, SecretError> {
        Self::from_slice(data)
    }

    /// Export the raw key bytes
    pub fn export_raw(&self) -> Zeroizing<[u8; SECRET_SIZE]> {
        Zeroizing::new(*self.bytes)
    }

    /// Drop the ability to export this key
    pub fn seal(self) -> Secret<Sealed> {
        Secret::from_bytes(*self.bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::<Sealed>::generate().unwrap();
        let data = b"hello world, this is a test message for encryption";

        let encrypted = secret.encrypt(data).unwrap();
        assert_eq!(encrypted.data.len(), data.len() + TAG_SIZE);

        let decrypted = secret.decrypt(&encrypted.data, &encrypted.nonce).unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let secret = Secret::<Sealed>::generate().unwrap();
        let a = secret.encrypt(b"same").unwrap();
        let b = secret.encrypt(b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_wrong_key_fails() {
        let secret = Secret::<Sealed>::generate().unwrap();
        let other = Secret::<Sealed>::generate().unwrap();
        let encrypted = secret.encrypt(b"data").unwrap();
        let result = other.decrypt(&encrypted.data, &encrypted.nonce);
        assert!(matches!(result, Err(SecretError::Decrypt)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let secret = Secret::<Sealed>::generate().unwrap();
        let mut encrypted = secret.encrypt(b"integrity check").unwrap();
        encrypted.data[3] ^= 0xFF;
        assert!(secret.decrypt(&encrypted.data, &encrypted.nonce).is_err());
    }

    #[test]
    fn test_nonce_size_validation() {
        let secret = Secret::<Sealed>::generate().unwrap();
        let encrypted = secret.encrypt(b"data").unwrap();
        let result = secret.decrypt(&encrypted.data, &encrypted.nonce[..8]);
        assert!(matches!(result, Err(SecretError::InvalidNonce(8))));
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(Secret::<Exportable>::import_raw(&[1u8; 16]).is_err());
        assert!(Secret::<Exportable>::import_raw(&[1u8; 64]).is_err());
        assert!(Secret::<Exportable>::import_raw(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_export_import_and_seal() {
        let key = Secret::<Exportable>::generate().unwrap();
        let raw = key.export_raw();
        let imported = Secret::<Exportable>::import_raw(raw.as_ref()).unwrap();

        let encrypted = key.encrypt(b"workspace data").unwrap();
        let sealed = imported.seal();
        let decrypted = sealed.decrypt(&encrypted.data, &encrypted.nonce).unwrap();
        assert_eq!(decrypted.as_slice(), b"workspace data");
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = Secret::<Sealed>::generate().unwrap();
        assert_eq!(format!("{:?}", key), "Secret<sealed>(..)");
    }
}
