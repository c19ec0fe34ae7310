//! Cryptographic primitives for Tandem
//!
//! This module provides the building blocks every other subsystem sits on:
//!
//! - **Identity & Authentication**: ECDSA P-256 keypairs (`SecretKey`/`PublicKey`)
//!   for user and device identities, exported as SPKI / PKCS8 DER
//! - **Symmetric Encryption**: AES-256-GCM `Secret` keys with a fresh random
//!   96-bit nonce per encryption
//! - **Password Hardening**: PBKDF2-HMAC-SHA256 key derivation
//!
//! # Key Capabilities
//!
//! Symmetric keys carry a capability tag in their type:
//! - `Secret<Exportable>` may be exported raw (workspace keys, which have to be
//!   wrapped for peers)
//! - `Secret<Sealed>` never exposes its bytes (root keys, password-derived keys,
//!   ECDH shared secrets)
//!
//! Trying to export a sealed key is a compile error, not a runtime check.

mod kdf;
mod keys;
mod secret;

pub use kdf::{derive_key, derive_password_key, generate_salt, PBKDF2_ITERATIONS, SALT_SIZE};
pub use keys::{KeyError, PublicKey, SecretKey, Signature, SIGNATURE_SIZE};
pub(crate) use keys::signature_from_bytes;
pub use secret::{
    Capability, Ciphertext, Exportable, Sealed, Secret, SecretError, NONCE_SIZE, SECRET_SIZE,
    TAG_SIZE,
};

use sha2::{Digest, Sha256};

/// Whether the platform can service cryptographic requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoSupport {
    Available,
    /// The OS random source could not be read; every key generation and
    ///  encryption would fail, so features depending on them should be
    ///  presented as disabled
    Unavailable(String),
}

impl CryptoSupport {
    pub fn is_available(&self) -> bool {
        matches!(self, CryptoSupport::Available)
    }
}

/// Probe the OS random source before attempting any cryptographic operation
pub fn check_support() -> CryptoSupport {
    let mut probe = [0u8; 1];
    match getrandom::getrandom(&mut probe) {
        Ok(()) => CryptoSupport::Available,
        Err(e) => {
            tracing::warn!("secure random source unavailable: {}", e);
            CryptoSupport::Unavailable(e.to_string())
        }
    }
}

/// Fill a fixed size buffer from the OS random source
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], SecretError> {
    let mut buff = [0u8; N];
    getrandom::getrandom(&mut buff).map_err(|_| SecretError::Rng)?;
    Ok(buff)
}

/// Hex encoded SHA-256 of `data`, truncated to `len` characters
pub(crate) fn hex_digest(data: &[u8], len: usize) -> String {
    let mut hex = hex::encode(Sha256::digest(data));
    hex.truncate(len);
    hex
}
