//! # Content encryption
//!
//! Sensitive fields are encrypted one by one before an entity is written into
//! the sync store, so the store (and every peer replicating it) only ever sees
//! `{ct, iv}` objects where the plaintext used to be. Everything else about
//! the entity (ids, timestamps, roles) stays readable for merging.
//!
//! Each entity type declares its sensitive fields through [`SensitiveFields`]
//! (see the `sensitive_fields!` registrations in [`entities`]). Objects without a
//! static type go through [`FieldCipher::encrypt_fields`] with an explicit list
//! of field names.
//!
//! Decryption is forgiving on purpose: plain strings from before encryption
//! pass through untouched, and a single undecryptable field degrades to `""`
//! instead of failing the whole record.

mod cipher;
pub mod entities;
mod field;

pub use cipher::{Decrypted, FieldCipher};
pub use entities::{
    Attachment, Conversation, KnowledgeItem, Memory, Message, MessageRole, SensitiveFields,
    ENCRYPTED_MARKER,
};
pub use field::{is_encrypted_field, safe_string, EncryptedField, Protected};

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("root key provider error: {0}")]
    Storage(String),
    #[error("sync store error: {0}")]
    Store(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("entity does not serialize to a JSON object")]
    NotAnObject,
}
