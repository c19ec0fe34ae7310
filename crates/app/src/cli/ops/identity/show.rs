use clap::Args;

use crate::state::StateError;

/// Print the stored identity
#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Print the full public record as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the encrypted backup code instead
    #[arg(long, conflicts_with = "json")]
    pub backup: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityShowError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to render identity: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored identity does not match its public key")]
    Inconsistent,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = IdentityShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if self.backup {
            return Ok(state.load_backup()?);
        }

        let identity = state.load_identity()?;
        if !identity.is_consistent() {
            return Err(IdentityShowError::Inconsistent);
        }
        if self.json {
            return Ok(serde_json::to_string_pretty(&identity)?);
        }

        Ok(format!(
            "Identity {}\n\
             - Display name: {}\n\
             - Public key: {}\n\
             - Created: {}",
            identity.id,
            identity.display_name.as_deref().unwrap_or("(none)"),
            identity.public_key.to_base64(),
            identity.created_at.to_rfc3339(),
        ))
    }
}
