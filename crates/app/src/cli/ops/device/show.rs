use clap::Args;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Show;

#[derive(Debug, thiserror::Error)]
pub enum DeviceShowError {
    #[error("state error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = DeviceShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let Some(device) = state.load_device()? else {
            return Ok("No device registered. Run 'tandem device register'".to_string());
        };

        Ok(format!(
            "Device {}\n\
             - Name: {}\n\
             - User: {}\n\
             - Last seen: {}",
            device.id,
            device.name,
            device.user_id,
            device.last_seen.to_rfc3339(),
        ))
    }
}
