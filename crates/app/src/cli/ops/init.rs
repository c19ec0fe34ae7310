use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Name to register this device under (defaults to a detected name)
    #[arg(long)]
    pub device_name: Option<String>,

    /// Default log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seconds a derived room key stays cached
    #[arg(long, default_value_t = 900)]
    pub room_key_ttl: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            log_level: self.log_level.clone(),
            device_name: self.device_name.clone(),
            room_key_ttl_secs: self.room_key_ttl,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized tandem directory at: {}\n\
             - Config: {}\n\
             - Device name: {}\n\
             - Log level: {}\n\
             - Room key TTL: {}s",
            state.tandem_dir.display(),
            state.config_path.display(),
            state.config.device_name.as_deref().unwrap_or("(detected)"),
            state.config.log_level,
            state.config.room_key_ttl_secs,
        );

        Ok(output)
    }
}
