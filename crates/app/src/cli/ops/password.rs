use clap::{Args, Subcommand};

use common::password::evaluate_password_strength;

use crate::cli::op::Op;

crate::command_enum! {
    (Check, Check),
}

pub type PasswordCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Password {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

#[async_trait::async_trait]
impl Op for Password {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Score a candidate room or backup password
#[derive(Args, Debug, Clone)]
pub struct Check {
    /// Password to score
    #[arg(env = "TANDEM_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("failed to render result: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl Op for Check {
    type Error = CheckError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let result = evaluate_password_strength(&self.password);
        if self.json {
            return Ok(serde_json::to_string_pretty(&result)?);
        }

        let mut output = format!(
            "Strength: {} ({}/4, ~{} bits)\nAcceptable: {}",
            result.level,
            result.score,
            result.entropy,
            if result.meets_minimum { "yes" } else { "no" },
        );
        for hint in &result.feedback {
            output.push_str(&format!("\n - {}", hint));
        }
        Ok(output)
    }
}
