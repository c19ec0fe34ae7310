use clap::Args;

use common::exchange::{generate_key_exchange_key_pair, ExchangeError, RoomInvite};
use common::identity::{import_identity, IdentityError};

use crate::state::StateError;

/// Print a room code carrying a fresh exchange key
#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Vouch for the exchange key with the stored identity
    #[arg(long)]
    pub sign: bool,

    /// Identity backup password, required with --sign
    #[arg(long, env = "TANDEM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InviteCreateError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("--sign needs the identity password (--password or TANDEM_PASSWORD)")]
    MissingPassword,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = InviteCreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // The exchange keypair only lives for this session
        let pair = generate_key_exchange_key_pair();

        let invite = if self.sign {
            let password = self
                .password
                .as_deref()
                .ok_or(InviteCreateError::MissingPassword)?;
            let state = ctx.state()?;
            let identity = import_identity(&state.load_backup()?, password).await?;
            RoomInvite::signed(&identity, pair.public_key)
        } else {
            RoomInvite::new(pair.public_key)
        };

        let code = invite.encode()?;
        tracing::debug!("created invite for session {}", invite.session_id);

        Ok(format!(
            "Session: {}\nSigned: {}\nCode: {}",
            invite.session_id,
            if invite.assertion.is_some() { "yes" } else { "no" },
            code,
        ))
    }
}
