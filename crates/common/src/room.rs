//! Password protected sync rooms
//!
//! Every device that knows a room's id and password derives the same room key,
//! so no key ever has to travel with the room code. Derivation is expensive,
//! so derived keys are cached per room for a bounded time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::crypto::{derive_password_key, Sealed, Secret, SecretError, SALT_SIZE};
use crate::password::{evaluate_password_strength, PasswordStrengthResult};

/// Domain separation for room key salts
const ROOM_SALT_CONTEXT: &[u8] = b"tandem-room-v1";

/// How long a derived room key stays cached unless configured otherwise
pub const DEFAULT_ROOM_KEY_TTL: Duration = Duration::from_secs(900);

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("room password is too weak ({})", .0.level)]
    WeakPassword(PasswordStrengthResult),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// Deterministic per-room salt: `SHA-256("tandem-room-v1" || room_id)[..16]`
pub fn room_salt(room_id: &str) -> [u8; SALT_SIZE] {
    let digest = Sha256::new()
        .chain_update(ROOM_SALT_CONTEXT)
        .chain_update(room_id.as_bytes())
        .finalize();
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&digest[..SALT_SIZE]);
    salt
}

fn password_digest(room_id: &str, password: &str) -> [u8; 32] {
    Sha256::new()
        .chain_update(room_id.as_bytes())
        .chain_update([0u8])
        .chain_update(password.as_bytes())
        .finalize()
        .into()
}

struct CachedRoomKey {
    key: Arc<Secret<Sealed>>,
    password_digest: [u8; 32],
    expires_at: Instant,
}

/// Derives room keys and caches them for a fixed time to live
pub struct RoomKeyring {
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedRoomKey>>,
}

impl std::fmt::Debug for RoomKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomKeyring")
            .field("ttl", &self.ttl)
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

impl Default for RoomKeyring {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_KEY_TTL)
    }
}

impl RoomKeyring {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The key for `room_id` under `password`
    ///
    /// Passwords that do not meet the minimum strength are refused before
    ///  any derivation happens.
    pub async fn room_key(
        &self,
        room_id: &str,
        password: &str,
    ) -> Result<Arc<Secret<Sealed>>, RoomError> {
        let evaluation = evaluate_password_strength(password);
        if !evaluation.meets_minimum {
            return Err(RoomError::WeakPassword(evaluation));
        }

        let digest = password_digest(room_id, password);
        if let Some(key) = self.cached(room_id, &digest) {
            return Ok(key);
        }

        let key = Arc::new(derive_password_key(password, &room_salt(room_id)).await?);
        self.cache.lock().insert(
            room_id.to_string(),
            CachedRoomKey {
                key: key.clone(),
                password_digest: digest,
                expires_at: Instant::now() + self.ttl,
            },
        );
        tracing::debug!("cached room key for {}", room_id);
        Ok(key)
    }

    fn cached(&self, room_id: &str, digest: &[u8; 32]) -> Option<Arc<Secret<Sealed>>> {
        let mut cache = self.cache.lock();
        let entry = cache.get(room_id)?;
        if entry.expires_at <= Instant::now() {
            cache.remove(room_id);
            tracing::debug!("room key for {} expired", room_id);
            return None;
        }
        if &entry.password_digest != digest {
            return None;
        }
        Some(entry.key.clone())
    }

    /// Drop every expired key, returning how many were dropped
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.lock();
        let before = cache.len();
        cache.retain(|_, entry| entry.expires_at > now);
        let evicted = before - cache.len();
        if evicted > 0 {
            tracing::debug!("evicted {} expired room keys", evicted);
        }
        evicted
    }

    /// Forget the key for one room, e.g. on leaving it
    pub fn forget(&self, room_id: &str) -> bool {
        self.cache.lock().remove(room_id).is_some()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached keys, expired ones not yet evicted included
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
