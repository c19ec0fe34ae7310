use clap::Args;

use common::identity::{export_identity, generate_user_identity, serialize_identity, IdentityError};
use common::password::{evaluate_password_strength, PasswordStrengthResult};

use crate::state::StateError;

/// Generate a new user identity and write its encrypted backup
#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Display name shown to peers
    #[arg(long)]
    pub name: Option<String>,

    /// Password protecting the identity backup
    #[arg(long, env = "TANDEM_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Replace an existing identity
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityCreateError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("an identity already exists; pass --force to replace it")]
    AlreadyExists,
    #[error("password too weak ({}): {}", .0.level, .0.feedback.join("; "))]
    WeakPassword(PasswordStrengthResult),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = IdentityCreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if state.has_identity() && !self.force {
            return Err(IdentityCreateError::AlreadyExists);
        }

        let strength = evaluate_password_strength(&self.password);
        if !strength.meets_minimum {
            return Err(IdentityCreateError::WeakPassword(strength));
        }

        let identity = generate_user_identity(self.name.clone());
        let backup = export_identity(&identity, &self.password).await?;
        state.save_identity(&serialize_identity(&identity), &backup)?;

        Ok(format!(
            "Created identity {}\n\
             - Display name: {}\n\
             - Backup: {}\n\
             Keep the backup file and its password safe; they are the only way to restore this identity.",
            identity.id,
            identity.display_name.as_deref().unwrap_or("(none)"),
            state.backup_path.display(),
        ))
    }
}
