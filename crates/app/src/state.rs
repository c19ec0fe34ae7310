use std::{fs, path::PathBuf};

use common::identity::{DeviceIdentity, UserIdentity};
use common::room::DEFAULT_ROOM_KEY_TTL;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

pub const APP_NAME: &str = "tandem";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const IDENTITY_FILE_NAME: &str = "identity.json";
pub const BACKUP_FILE_NAME: &str = "identity.backup";
pub const DEVICE_FILE_NAME: &str = "device.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Name to register this device under instead of the detected one
    #[serde(default)]
    pub device_name: Option<String>,
    /// How long derived room keys stay cached
    #[serde(default = "default_room_key_ttl_secs")]
    pub room_key_ttl_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_room_key_ttl_secs() -> u64 {
    DEFAULT_ROOM_KEY_TTL.as_secs()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            device_name: None,
            room_key_ttl_secs: default_room_key_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// The configured level, falling back to INFO if it does not parse
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the tandem directory (~/.tandem)
    pub tandem_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Public view of the user identity
    pub identity_path: PathBuf,
    /// Password protected identity backup
    pub backup_path: PathBuf,
    /// Public view of this device
    pub device_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the tandem directory path (custom or default ~/.tandem)
    pub fn tandem_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn at(tandem_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: tandem_dir.join(CONFIG_FILE_NAME),
            identity_path: tandem_dir.join(IDENTITY_FILE_NAME),
            backup_path: tandem_dir.join(BACKUP_FILE_NAME),
            device_path: tandem_dir.join(DEVICE_FILE_NAME),
            tandem_dir,
            config,
        }
    }

    /// Initialize a new tandem state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let tandem_dir = Self::tandem_dir(custom_path)?;

        if tandem_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&tandem_dir)?;

        let state = Self::at(tandem_dir, config.unwrap_or_default());
        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        Ok(state)
    }

    /// Load existing state from the tandem directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let tandem_dir = Self::tandem_dir(custom_path)?;

        if !tandem_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = tandem_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self::at(tandem_dir, config))
    }

    pub fn has_identity(&self) -> bool {
        self.identity_path.exists() && self.backup_path.exists()
    }

    /// Persist the public identity view and its encrypted backup
    pub fn save_identity(&self, identity: &UserIdentity, backup: &str) -> Result<(), StateError> {
        fs::write(&self.identity_path, serde_json::to_string_pretty(identity)?)?;
        fs::write(&self.backup_path, backup)?;
        Ok(())
    }

    pub fn load_identity(&self) -> Result<UserIdentity, StateError> {
        if !self.identity_path.exists() {
            return Err(StateError::NoIdentity);
        }
        let json = fs::read_to_string(&self.identity_path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn load_backup(&self) -> Result<String, StateError> {
        if !self.backup_path.exists() {
            return Err(StateError::NoIdentity);
        }
        Ok(fs::read_to_string(&self.backup_path)?.trim().to_string())
    }

    pub fn save_device(&self, device: &DeviceIdentity) -> Result<(), StateError> {
        fs::write(&self.device_path, serde_json::to_string_pretty(device)?)?;
        Ok(())
    }

    pub fn load_device(&self) -> Result<Option<DeviceIdentity>, StateError> {
        if !self.device_path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.device_path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("tandem directory not initialized. Run 'tandem init' first")]
    NotInitialized,

    #[error("tandem directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("no identity yet. Run 'tandem identity create' or 'tandem identity restore'")]
    NoIdentity,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
