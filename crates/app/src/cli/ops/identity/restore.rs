use std::path::PathBuf;

use clap::Args;

use common::identity::{import_identity, serialize_identity, IdentityError};

use crate::state::StateError;

/// Restore an identity from a backup file
#[derive(Args, Debug, Clone)]
pub struct Restore {
    /// Backup file written by `identity create` or copied from another device
    #[arg(long)]
    pub file: PathBuf,

    /// Password the backup was created with
    #[arg(long, env = "TANDEM_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Replace an existing identity
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityRestoreError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to read backup: {0}")]
    Io(#[from] std::io::Error),
    #[error("restore failed: {0}")]
    Identity(#[from] IdentityError),
    #[error("an identity already exists; pass --force to replace it")]
    AlreadyExists,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Restore {
    type Error = IdentityRestoreError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if state.has_identity() && !self.force {
            return Err(IdentityRestoreError::AlreadyExists);
        }

        let backup = std::fs::read_to_string(&self.file)?;
        let identity = import_identity(&backup, &self.password).await?;
        state.save_identity(&serialize_identity(&identity), backup.trim())?;

        Ok(format!(
            "Restored identity {} ({})",
            identity.id,
            identity.display_name.as_deref().unwrap_or("no display name"),
        ))
    }
}
