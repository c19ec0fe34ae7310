use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand_core::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

pub use p256::ecdsa::Signature;

/// Size of a raw (r || s) P-256 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid SPKI public key")]
    InvalidPublicKey,
    #[error("invalid PKCS8 private key")]
    InvalidPrivateKey,
    #[error("invalid signature encoding")]
    InvalidSignature,
}

/// ECDSA P-256 public key for user and device identities
///
/// Always carried around together with its SPKI DER encoding, which is the
/// form that is hashed into identity ids and shipped over the wire (base64).
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate();
/// let public_key = secret_key.public();
///
/// let b64 = public_key.to_base64();
/// let recovered = PublicKey::from_base64(&b64)?;
/// assert_eq!(public_key, recovered);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
    spki: Vec<u8>,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.fingerprint(16)).finish()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        // Encoding a valid curve point as SPKI cannot fail
        let spki = key
            .to_public_key_der()
            .expect("P-256 SPKI encoding")
            .as_bytes()
            .to_vec();
        PublicKey { key, spki }
    }
}

impl PublicKey {
    /// Parse a public key from SPKI DER bytes
    pub fn from_spki_der(der: &[u8]) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_public_key_der(der).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(key.into())
    }

    /// Parse a public key from base64 encoded SPKI DER
    pub fn from_base64(b64: &str) -> Result<Self, KeyError> {
        let der = STANDARD.decode(b64.trim())?;
        Self::from_spki_der(&der)
    }

    /// SPKI DER encoding of the key
    pub fn spki_der(&self) -> &[u8] {
        &self.spki
    }

    /// Base64 encoded SPKI DER
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.spki)
    }

    /// First `len` hex characters of SHA-256 over the SPKI encoding
    ///
    /// This is what user (32) and device (16) ids are made of.
    pub fn fingerprint(&self, len: usize) -> String {
        super::hex_digest(&self.spki, len)
    }

    /// Verify an ECDSA-SHA256 signature on a message
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), p256::ecdsa::Error> {
        self.key.verify(msg, signature)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let b64 = String::deserialize(deserializer)?;
        PublicKey::from_base64(&b64).map_err(serde::de::Error::custom)
    }
}

/// ECDSA P-256 private key
///
/// Never serialized directly. The only way out of the process is
/// [`SecretKey::to_pkcs8_der`], which callers are expected to encrypt before
/// the bytes touch a disk or a network (see `identity::export_identity`).
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

impl SecretKey {
    /// Generate a new random key using the OS random source
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey::from(*self.0.verifying_key())
    }

    /// Encode as PKCS8 DER
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        let doc = self
            .0
            .to_pkcs8_der()
            .map_err(|e| anyhow::anyhow!("failed to encode private key: {}", e))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    /// Parse a key from PKCS8 DER
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        let key = SigningKey::from_pkcs8_der(der).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self(key))
    }

    /// Sign a message with ECDSA-SHA256
    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.0.sign(msg)
    }
}

/// Parse a raw 64 byte (r || s) signature
pub(crate) fn signature_from_bytes(bytes: &[u8]) -> Result<Signature, KeyError> {
    if bytes.len() != SIGNATURE_SIZE {
        return Err(KeyError::InvalidSignature);
    }
    Signature::from_slice(bytes).map_err(|_| KeyError::InvalidSignature)
}
