use clap::Args;

use common::exchange::{ExchangeError, RoomInvite};

/// Decode a room code and check who vouches for it
#[derive(Args, Debug, Clone)]
pub struct Inspect {
    /// Room code as shared by the creator
    pub code: String,

    /// Require the code to be signed by this user id
    #[arg(long)]
    pub expect: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InviteInspectError {
    #[error("invalid invite: {0}")]
    Exchange(#[from] ExchangeError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inspect {
    type Error = InviteInspectError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let invite = RoomInvite::decode(&self.code)?;

        let signer = match (&invite.assertion, &self.expect) {
            (None, None) => "unsigned (verify the code out of band)".to_string(),
            (None, Some(_)) => return Err(ExchangeError::Unauthenticated.into()),
            (Some(assertion), expect) => {
                invite.authenticated_key(expect.as_deref())?;
                format!("signed by {}", assertion.identity_id)
            }
        };

        Ok(format!(
            "Session: {}\nExchange key: {}\nAuthenticity: {}",
            invite.session_id,
            invite.public_key.to_base64(),
            signer,
        ))
    }
}
