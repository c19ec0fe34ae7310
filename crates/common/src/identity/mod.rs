//! # Identities
//!
//! Two kinds of long-lived identity exist:
//!
//! - A **user identity** ([`UserIdentity`]), created once during onboarding or
//!   restored from a password protected backup. Its id is the first 32 hex
//!   characters of SHA-256 over the SPKI encoded ECDSA P-256 public key, so an
//!   id can never be assigned independently of the key it names.
//! - A **device identity** ([`DeviceIdentity`]), one per activated device, with
//!   its own keypair. Compromising a device key never exposes the user's key
//!   or any other device's key. Device ids are 16 hex characters.
//!
//! Private keys live only inside the `*WithKeys` runtime types. The plain
//! types are the storage safe views.

mod backup;
mod device;
mod user;

pub use backup::{export_identity, import_identity, ExportedIdentity, IDENTITY_EXPORT_VERSION};
pub use device::{
    detect_device_name, generate_device_identity, update_device_last_seen, DeviceIdentity,
    DeviceIdentityWithKeys, DEVICE_ID_LENGTH,
};
pub use user::{
    generate_user_identity, serialize_identity, sign_data, user_id_for, verify_signature,
    UserIdentity, UserIdentityWithKeys, USER_ID_LENGTH,
};

use crate::crypto::{KeyError, SecretError};

/// Errors that can occur while creating, exporting or restoring identities
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("malformed identity backup: {0}")]
    Malformed(String),
    #[error("unsupported identity backup version: {0}")]
    UnsupportedVersion(u64),
    /// Wrong password or a corrupted backup. The two cannot be told apart.
    #[error("invalid password or corrupted data")]
    Decryption,
    #[error("identity backup does not match its key material")]
    Mismatch,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}
