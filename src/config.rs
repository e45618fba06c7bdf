//! Runtime configuration.
//!
//! Only host adaptation lives here: sysfs paths and poll intervals. The key
//! mapping, the device identity and the vibration strength are fixed
//! constants and deliberately not configurable.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_DIR: &str = ".config/homekeyd";
const CONFIG_FILE: &str = "homekeyd.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Framebuffer blank attribute mirrored into the display state.
    pub fb_blank_path: PathBuf,

    /// Timed-output enable attribute of the vibrator.
    pub vibrator_path: PathBuf,

    /// How often the evdev nodes are rescanned for hotplugged devices.
    pub rescan_interval_ms: u64,

    /// How often the blank attribute is sampled.
    pub blank_poll_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fb_blank_path: PathBuf::from("/sys/class/graphics/fb0/blank"),
            vibrator_path: PathBuf::from("/sys/class/timed_output/vibrator/enable"),
            rescan_interval_ms: 2000,
            blank_poll_interval_ms: 500,
        }
    }
}

impl RuntimeConfig {
    /// Loads the user config, falling back to defaults when the file is
    /// missing or broken. Never fails: a bad config degrades, it does not
    /// stop the service.
    pub async fn load() -> Self {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);

        match Self::load_from(&path).await {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(ConfigError::ReadError(_)) => {
                info!(
                    "No configuration at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
