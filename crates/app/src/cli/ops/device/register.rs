use clap::Args;

use common::identity::generate_device_identity;

use crate::state::StateError;

/// Register this machine as a device of the stored identity
#[derive(Args, Debug, Clone)]
pub struct Register {
    /// Device name (falls back to the configured name, then a detected one)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceRegisterError {
    #[error("state error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = DeviceRegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let identity = state.load_identity()?;

        if let Some(previous) = state.load_device()? {
            tracing::info!("replacing device {} ({})", previous.id, previous.name);
        }

        let name = self.name.clone().or_else(|| state.config.device_name.clone());
        let device = generate_device_identity(&identity.id, name);
        state.save_device(device.device())?;

        Ok(format!(
            "Registered device {} ({}) for identity {}",
            device.id, device.name, identity.id
        ))
    }
}
