use clap::{Args, Subcommand};

pub mod create;
pub mod inspect;

use crate::cli::op::Op;

crate::command_enum! {
    (Create, create::Create),
    (Inspect, inspect::Inspect),
}

pub type InviteCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Invite {
    #[command(subcommand)]
    pub command: InviteCommand,
}

#[async_trait::async_trait]
impl Op for Invite {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
