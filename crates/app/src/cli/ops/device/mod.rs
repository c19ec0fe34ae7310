use clap::{Args, Subcommand};

pub mod register;
pub mod show;

use crate::cli::op::Op;

crate::command_enum! {
    (Register, register::Register),
    (Show, show::Show),
}

pub type DeviceCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Device {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[async_trait::async_trait]
impl Op for Device {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
