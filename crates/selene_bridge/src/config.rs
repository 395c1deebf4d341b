//! Bridge configuration (selene.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::codec::CodecKind;
use crate::device::DEVICE_CHANNEL;
use crate::error::{BridgeError, Result};

/// File name the host looks for, both on disk and among APK assets.
pub const CONFIG_FILE_NAME: &str = "selene.toml";

/// Top-level bridge configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log tag (logcat tag on Android)
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Maximum level or filter directive, e.g. `info` or `selene_bridge=debug`
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_tag() -> String {
    "Selene".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            level: default_level(),
        }
    }
}

/// Device channel configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Channel the device bridge is registered on
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Wire format of the channel: `standard` (Flutter's default) or `json`
    #[serde(default)]
    pub codec: CodecKind,
}

fn default_channel() -> String {
    DEVICE_CHANNEL.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            codec: CodecKind::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BridgeConfig =
            toml::from_str(content).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or from `selene.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.device.channel.trim().is_empty() {
            return Err(BridgeError::Config(
                "device.channel must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
