/**
 * Cryptographic types and operations.
 *  - ECDSA P-256 identity keys
 *  - AES-256-GCM secrets with capability tags
 *  - PBKDF2 password key derivation
 */
pub mod crypto;
/**
 * User and device identities, plus password
 *  protected identity backups.
 */
pub mod identity;
/**
 * ECDH key agreement and workspace key
 *  distribution between peers.
 */
pub mod exchange;
/**
 * Root key providers that protect data at rest
 *  on this device.
 */
pub mod storage;
/**
 * Interface to the replicated key/value store
 *  that encrypted entities are written into.
 */
pub mod store;
/**
 * Field-level encryption of entities before
 *  they enter the sync store.
 */
pub mod content;
/**
 * Password strength scoring.
 */
pub mod password;
/**
 * Password derived room keys with a bounded
 *  lifetime cache.
 */
pub mod room;

/// Current time at the millisecond precision timestamps are stored with
pub(crate) fn now() -> chrono::DateTime<chrono::Utc> {
    use chrono::SubsecRound;
    chrono::Utc::now().trunc_subsecs(3)
}

pub mod prelude {
    pub use crate::content::{
        Decrypted, EncryptedField, FieldCipher, Protected, SensitiveFields,
    };
    pub use crate::crypto::{
        check_support, CryptoSupport, Exportable, PublicKey, Sealed, Secret, SecretKey,
    };
    pub use crate::exchange::{
        ExchangeKeyPair, ExchangePublicKey, RoomInvite, SignedExchangeKey, WorkspaceKey,
        WrappedKey,
    };
    pub use crate::identity::{
        DeviceIdentity, DeviceIdentityWithKeys, UserIdentity, UserIdentityWithKeys,
    };
    pub use crate::password::{evaluate_password_strength, PasswordStrengthResult, StrengthLevel};
    pub use crate::room::RoomKeyring;
    pub use crate::storage::{LocalSecureStorage, SecureStorage};
    pub use crate::store::{MemorySyncStore, SyncStore};
}
