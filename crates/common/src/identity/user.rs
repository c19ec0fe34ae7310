use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey, Signature};

/// Length of a user id in hex characters
pub const USER_ID_LENGTH: usize = 32;

/// The storage safe view of a user identity
///
/// Serializes to `{id, publicKey, displayName?, avatar?, createdAt}` with the
/// public key as base64 SPKI and `createdAt` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub public_key: PublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl UserIdentity {
    /// Whether `id` is actually derived from `public_key`
    pub fn is_consistent(&self) -> bool {
        self.id == user_id_for(&self.public_key)
    }

    /// Verify a signature produced by this identity
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        verify_signature(&self.public_key, data, signature)
    }
}

/// A user identity together with its private key
///
/// Runtime only. There is deliberately no `Serialize` impl; use
/// [`serialize_identity`] for the key-free view or
/// [`export_identity`](super::export_identity) for an encrypted backup.
#[derive(Debug, Clone)]
pub struct UserIdentityWithKeys {
    identity: UserIdentity,
    secret_key: SecretKey,
}

impl Deref for UserIdentityWithKeys {
    type Target = UserIdentity;
    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

impl UserIdentityWithKeys {
    pub(crate) fn from_parts(identity: UserIdentity, secret_key: SecretKey) -> Self {
        Self {
            identity,
            secret_key,
        }
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.identity.display_name = display_name;
    }

    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.identity.avatar = avatar;
    }

    /// Sign a message with the identity key
    pub fn sign(&self, data: &[u8]) -> Signature {
        self.secret_key.sign(data)
    }
}

/// The id a user identity with this public key must have
pub fn user_id_for(public_key: &PublicKey) -> String {
    public_key.fingerprint(USER_ID_LENGTH)
}

/// Create a brand new user identity with a fresh ECDSA P-256 keypair
pub fn generate_user_identity(display_name: Option<String>) -> UserIdentityWithKeys {
    let secret_key = SecretKey::generate();
    let public_key = secret_key.public();
    let id = user_id_for(&public_key);

    tracing::info!("generated user identity {}", id);

    UserIdentityWithKeys {
        identity: UserIdentity {
            id,
            public_key,
            display_name,
            avatar: None,
            created_at: crate::now(),
        },
        secret_key,
    }
}

/// Project out the key-free view of an identity for storage
pub fn serialize_identity(identity: &UserIdentityWithKeys) -> UserIdentity {
    identity.identity.clone()
}

/// Sign `data` with ECDSA-SHA256, returning the raw 64 byte (r || s) signature
pub fn sign_data(identity: &UserIdentityWithKeys, data: &[u8]) -> Vec<u8> {
    identity.sign(data).to_bytes().to_vec()
}

/// Check a raw (r || s) signature over `data`
///
/// Malformed signatures verify as `false` rather than erroring.
pub fn verify_signature(public_key: &PublicKey, data: &[u8], signature: &[u8]) -> bool {
    match crate::crypto::signature_from_bytes(signature) {
        Ok(signature) => public_key.verify(data, &signature).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_derived() {
        let a = generate_user_identity(Some("Alice".to_string()));
        let b = generate_user_identity(None);

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), USER_ID_LENGTH);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(a.is_consistent());
        assert_eq!(a.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_serialize_identity_is_key_free() {
        let mut identity = generate_user_identity(Some("Alice".to_string()));
        identity.set_avatar(Some("🦀".to_string()));

        let view = serialize_identity(&identity);
        let json = serde_json::to_value(&view).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["avatar", "createdAt", "displayName", "id", "publicKey"]
        );
        assert_eq!(obj["publicKey"], identity.public_key.to_base64());
        assert!(obj["createdAt"].is_i64());
    }

    #[test]
    fn test_sign_and_verify() {
        let identity = generate_user_identity(None);
        let signature = sign_data(&identity, b"operation");

        assert_eq!(signature.len(), 64);
        assert!(verify_signature(&identity.public_key, b"operation", &signature));
        assert!(identity.verify(b"operation", &signature));
        assert!(!verify_signature(&identity.public_key, b"tampered", &signature));
        assert!(!verify_signature(&identity.public_key, b"operation", &signature[..10]));

        let other = generate_user_identity(None);
        assert!(!verify_signature(&other.public_key, b"operation", &signature));
    }

    #[test]
    fn test_identity_view_roundtrip() {
        let identity = generate_user_identity(Some("Bob".to_string()));
        let view = serialize_identity(&identity);
        let json = serde_json::to_string(&view).unwrap();
        let recovered: UserIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, view);
        assert!(recovered.is_consistent());
    }
}
