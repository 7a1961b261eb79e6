//! Configuration management for the C64 game of the day
//!
//! Holds the well-known constants shared with the external emulator library,
//! the default control/option/button maps, the rotation policy and the
//! TOML-based config file.

mod emulator_config;
mod rotation;

pub use emulator_config::{
    ButtonVisibility, ControlBinding, ControlMap, EmulatorConfig, OptionMap, default_buttons,
    default_controls, default_options,
};
pub use rotation::{DEV_WINDOW_SECS, ONE_DAY_SECS, RotationPolicy};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/gotd";
pub const USER_CONFIG_DIR: &str = ".config/gotd";
pub const CONFIG_FILE: &str = "config.toml";

/// Storage key holding the serialized play history
pub const GAME_HISTORY_KEY: &str = "c64gotd_game_history";

/// Storage key holding the generated per-browser user id
pub const USER_ID_KEY: &str = "starUserId";

/// Display name of the record returned when no game could be found
pub const NOT_FOUND_GAME_NAME: &str = "NO GAMES FOUND :-(";

/// Persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file backing the key/value store
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_history_key")]
    pub history_key: String,

    #[serde(default = "default_user_id_key")]
    pub user_id_key: String,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("gotd-state.json")
}

fn default_history_key() -> String {
    GAME_HISTORY_KEY.to_string()
}

fn default_user_id_key() -> String {
    USER_ID_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            history_key: default_history_key(),
            user_id_key: default_user_id_key(),
        }
    }
}

/// Catalog and rating API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-side timeout for the game of the day request
    #[serde(default = "default_game_of_the_day_timeout_ms")]
    pub game_of_the_day_timeout_ms: u64,

    /// Timeout for every other request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_game_of_the_day_timeout_ms() -> u64 {
    2_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            game_of_the_day_timeout_ms: default_game_of_the_day_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GotdConfig {
    #[serde(default)]
    pub rotation: RotationPolicy,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub emulator: EmulatorConfig,
}

impl GotdConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the lifecycle manager cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emulator.container_id.is_empty() {
            return Err(ConfigError::Invalid("emulator.container_id is empty".into()));
        }
        if self.emulator.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "emulator.poll_interval_ms must be positive".into(),
            ));
        }
        if self.emulator.ready_timeout_ms < self.emulator.poll_interval_ms {
            return Err(ConfigError::Invalid(
                "emulator.ready_timeout_ms is shorter than the poll interval".into(),
            ));
        }
        if let RotationPolicy::FixedWindow { window_secs: 0 } = self.rotation {
            return Err(ConfigError::Invalid("rotation.window_secs must be positive".into()));
        }
        Ok(())
    }
}

/// `$HOME/.config/gotd/config.toml`, if a home directory is known
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(USER_CONFIG_DIR).join(CONFIG_FILE))
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
