//! # Key exchange
//!
//! Devices that share a workspace all hold the same AES-256 **workspace key**.
//! It never crosses the signaling path in plaintext. Instead:
//!
//! 1. Each peer generates an ECDH P-256 keypair used only for key agreement
//!    ([`generate_key_exchange_key_pair`]) and publishes the public half,
//!    usually inside a [`RoomInvite`].
//! 2. The sender derives the pairwise secret from its private key and the
//!    recipient's public key ([`derive_shared_secret`]) and wraps the raw
//!    workspace key under it ([`encrypt_key_for_recipient`]).
//! 3. The recipient derives the same secret from the mirrored pair and
//!    unwraps ([`decrypt_key_from_sender`]).
//!
//! An ECDH public key says nothing about who holds it. A
//! [`SignedExchangeKey`] binds one to a long-term user identity so a relay
//! cannot substitute its own key.

mod invite;
mod keys;
mod workspace;

pub use invite::{RoomInvite, SignedExchangeKey};
pub use keys::{
    derive_shared_secret, export_public_key_for_exchange, generate_key_exchange_key_pair,
    import_public_key_for_exchange, ExchangeKeyPair, ExchangePublicKey, ExchangeSecretKey,
};
pub use workspace::{
    decrypt_key_from_sender, encrypt_key_for_recipient, generate_workspace_key, WorkspaceKey,
    WrappedKey,
};

use crate::crypto::{KeyError, SecretError};

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("exchange error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid exchange public key")]
    InvalidPublicKey,
    #[error("invalid room code: {0}")]
    InvalidInvite(String),
    #[error("exchange key signature does not verify")]
    BadSignature,
    #[error("exchange key is asserted by {actual}, expected {expected}")]
    UnexpectedIdentity { expected: String, actual: String },
    #[error("room invite carries no identity assertion")]
    Unauthenticated,
    /// Wrapped key could not be opened: wrong keypair or tampered data
    #[error("invalid password or corrupted data")]
    Unwrap,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}
