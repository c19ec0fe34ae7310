use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use p256::ecdh::diffie_hellman;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use rand_core::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use super::ExchangeError;
use crate::crypto::{Sealed, Secret, SECRET_SIZE};

/// ECDH P-256 public key, only ever used for key agreement
#[derive(Clone, PartialEq, Eq)]
pub struct ExchangePublicKey {
    key: p256::PublicKey,
    spki: Vec<u8>,
}

impl fmt::Debug for ExchangePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExchangePublicKey")
            .field(&crate::crypto::hex_digest(&self.spki, 16))
            .finish()
    }
}

impl From<p256::PublicKey> for ExchangePublicKey {
    fn from(key: p256::PublicKey) -> Self {
        // Encoding a valid curve point as SPKI cannot fail
        let spki = key
            .to_public_key_der()
            .expect("P-256 SPKI encoding")
            .as_bytes()
            .to_vec();
        Self { key, spki }
    }
}

impl ExchangePublicKey {
    pub fn from_spki_der(der: &[u8]) -> Result<Self, ExchangeError> {
        let key =
            p256::PublicKey::from_public_key_der(der).map_err(|_| ExchangeError::InvalidPublicKey)?;
        Ok(key.into())
    }

    pub fn spki_der(&self) -> &[u8] {
        &self.spki
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.spki)
    }
}

impl Serialize for ExchangePublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ExchangePublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let b64 = String::deserialize(deserializer)?;
        import_public_key_for_exchange(&b64).map_err(serde::de::Error::custom)
    }
}

/// ECDH P-256 private key
#[derive(Clone)]
pub struct ExchangeSecretKey(p256::SecretKey);

impl fmt::Debug for ExchangeSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExchangeSecretKey(..)")
    }
}

impl ExchangeSecretKey {
    pub fn generate() -> Self {
        Self(p256::SecretKey::random(&mut OsRng))
    }

    pub fn public(&self) -> ExchangePublicKey {
        self.0.public_key().into()
    }
}

/// An ephemeral key agreement keypair
#[derive(Debug, Clone)]
pub struct ExchangeKeyPair {
    pub public_key: ExchangePublicKey,
    pub private_key: ExchangeSecretKey,
}

pub fn generate_key_exchange_key_pair() -> ExchangeKeyPair {
    let private_key = ExchangeSecretKey::generate();
    tracing::debug!("generated key exchange keypair");
    ExchangeKeyPair {
        public_key: private_key.public(),
        private_key,
    }
}

/// Derive the pairwise AES-256-GCM key between two exchange keypairs
///
/// The raw 256-bit shared x-coordinate is used as the key directly, with no
///  further key derivation step.
/// `(a.private, b.public)` and `(b.private, a.public)` yield the same key.
pub fn derive_shared_secret(
    private_key: &ExchangeSecretKey,
    peer_public_key: &ExchangePublicKey,
) -> Secret<Sealed> {
    let shared = diffie_hellman(private_key.0.to_nonzero_scalar(), peer_public_key.key.as_affine());
    let mut bytes = Zeroizing::new([0u8; SECRET_SIZE]);
    bytes.copy_from_slice(&shared.raw_secret_bytes()[..]);
    Secret::from_bytes(*bytes)
}

/// Base64 SPKI encoding of an exchange public key
pub fn export_public_key_for_exchange(public_key: &ExchangePublicKey) -> String {
    public_key.to_base64()
}

/// Parse a base64 SPKI encoded exchange public key
pub fn import_public_key_for_exchange(b64: &str) -> Result<ExchangePublicKey, ExchangeError> {
    let der = STANDARD.decode(b64.trim())?;
    ExchangePublicKey::from_spki_der(&der)
}
