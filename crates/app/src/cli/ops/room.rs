use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Args, Subcommand};

use common::crypto::{SecretError, NONCE_SIZE};
use common::room::{RoomError, RoomKeyring, DEFAULT_ROOM_KEY_TTL};

use crate::cli::op::{Op, OpContext};

crate::command_enum! {
    (Seal, Seal),
    (Open, Open),
}

pub type RoomCommand = Command;

/// Encrypt and decrypt with a password protected room key
#[derive(Args, Debug, Clone)]
pub struct Room {
    #[command(subcommand)]
    pub command: RoomCommand,
}

#[async_trait::async_trait]
impl Op for Room {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoomOpError {
    #[error("room error: {0}")]
    Room(#[from] RoomError),
    #[error("crypto error: {0}")]
    Secret(#[from] SecretError),
    #[error("sealed message is not valid base64")]
    Encoding,
    #[error("sealed message is too short")]
    Truncated,
    #[error("wrong room password or corrupted message")]
    Decrypt,
    #[error("message is not valid UTF-8")]
    Utf8,
}

/// A keyring honoring the configured TTL, or the default outside a state directory
fn keyring(ctx: &OpContext) -> RoomKeyring {
    let ttl = ctx
        .state()
        .map(|state| Duration::from_secs(state.config.room_key_ttl_secs))
        .unwrap_or(DEFAULT_ROOM_KEY_TTL);
    RoomKeyring::new(ttl)
}

/// Encrypt a message for everyone holding the room password
#[derive(Args, Debug, Clone)]
pub struct Seal {
    /// Room the message belongs to
    pub room_id: String,

    /// Plaintext message
    pub message: String,

    /// Room password
    #[arg(long, env = "TANDEM_ROOM_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[async_trait::async_trait]
impl Op for Seal {
    type Error = RoomOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let key = keyring(ctx).room_key(&self.room_id, &self.password).await?;
        let sealed = key.encrypt(self.message.as_bytes())?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.data.len());
        out.extend_from_slice(&sealed.nonce);
        out.extend_from_slice(&sealed.data);
        Ok(STANDARD.encode(out))
    }
}

/// Decrypt a message produced by `room seal`
#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Room the message belongs to
    pub room_id: String,

    /// base64 nonce followed by ciphertext
    pub sealed: String,

    /// Room password
    #[arg(long, env = "TANDEM_ROOM_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[async_trait::async_trait]
impl Op for Open {
    type Error = RoomOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let raw = STANDARD
            .decode(self.sealed.trim())
            .map_err(|_| RoomOpError::Encoding)?;
        if raw.len() <= NONCE_SIZE {
            return Err(RoomOpError::Truncated);
        }
        let (nonce, data) = raw.split_at(NONCE_SIZE);

        let key = keyring(ctx).room_key(&self.room_id, &self.password).await?;
        let plaintext = key.decrypt(data, nonce).map_err(|e| match e {
            SecretError::Decrypt => RoomOpError::Decrypt,
            other => RoomOpError::Secret(other),
        })?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| RoomOpError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "Tr0ub4dor&3xyz!";

    #[tokio::test]
    async fn test_seal_then_open() {
        let ctx = OpContext::new(Some("/nonexistent/tandem".into()));
        let sealed = Seal {
            room_id: "room-1".to_string(),
            message: "meet at noon".to_string(),
            password: PASSWORD.to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let opened = Open {
            room_id: "room-1".to_string(),
            sealed: sealed.clone(),
            password: PASSWORD.to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(opened, "meet at noon");

        let wrong_room = Open {
            room_id: "room-2".to_string(),
            sealed,
            password: PASSWORD.to_string(),
        }
        .execute(&ctx)
        .await;
        assert!(matches!(wrong_room, Err(RoomOpError::Decrypt)));
    }

    #[tokio::test]
    async fn test_weak_password_refused() {
        let ctx = OpContext::default();
        let result = Seal {
            room_id: "room".to_string(),
            message: "hi".to_string(),
            password: "password".to_string(),
        }
        .execute(&ctx)
        .await;
        assert!(matches!(result, Err(RoomOpError::Room(RoomError::WeakPassword(_)))));
    }

    #[tokio::test]
    async fn test_open_rejects_garbage() {
        let ctx = OpContext::default();
        let open = |sealed: &str| Open {
            room_id: "room".to_string(),
            sealed: sealed.to_string(),
            password: PASSWORD.to_string(),
        };
        assert!(matches!(
            open("not base64!").execute(&ctx).await,
            Err(RoomOpError::Encoding)
        ));
        assert!(matches!(
            open("AAAA").execute(&ctx).await,
            Err(RoomOpError::Truncated)
        ));
    }
}
