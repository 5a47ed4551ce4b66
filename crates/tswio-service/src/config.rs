//! Bridge configuration management and validation
//!
//! The configuration lives in a single JSON file. A missing file is created
//! with defaults on first load so the user has something to edit.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tswio_buttons::{BindingDefaults, MAX_REPEAT_INTERVAL_MS};
use tswio_lever::AnalyzerConfig;
use tswio_simulator::SimulatorSettings;

use crate::observability::LoggingConfig;

pub const SCHEMA_VERSION: &str = "tswio.config/1";

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Configuration schema version
    pub schema_version: String,
    /// Simulator connection
    pub simulator: SimulatorSettings,
    /// Lever analyzer tuning
    pub analyzer: AnalyzerConfig,
    /// Device handshake and liveness
    pub devices: DeviceConfig,
    /// Button controller defaults
    pub buttons: ButtonsConfig,
    /// Output binding polling
    pub outputs: OutputsConfig,
    /// Train detection
    pub train: TrainConfig,
    /// Keystroke injection
    pub keystroke: KeystrokeConfig,
    /// Logging
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// How long to wait for an identity response
    pub identity_timeout_ms: u64,
    /// How long to wait for a configuration upload to be acknowledged
    pub configure_timeout_ms: u64,
    /// Heartbeat silence after which a device is reported stale
    pub heartbeat_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonsConfig {
    /// Repeat interval for momentary bindings that do not set one
    pub default_repeat_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputsConfig {
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub poll_interval_ms: u64,
    /// Simulator path whose value identifies the driven formation
    pub detection_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystrokeConfig {
    /// Helper program invoked as `<helper> down|up|tap <combo>`.
    /// Keystroke bindings fail when unset.
    pub helper: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            simulator: SimulatorSettings::default(),
            analyzer: AnalyzerConfig::default(),
            devices: DeviceConfig::default(),
            buttons: ButtonsConfig::default(),
            outputs: OutputsConfig::default(),
            train: TrainConfig::default(),
            keystroke: KeystrokeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            identity_timeout_ms: 2000,
            configure_timeout_ms: 5000,
            heartbeat_timeout_ms: 3000,
        }
    }
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            default_repeat_interval_ms: BindingDefaults::default().repeat_interval_ms,
        }
    }
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            detection_path: "CurrentFormation/0.ObjectClass".to_string(),
        }
    }
}

impl DeviceConfig {
    pub fn identity_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_timeout_ms)
    }

    pub fn configure_timeout(&self) -> Duration {
        Duration::from_millis(self.configure_timeout_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

impl ButtonsConfig {
    pub fn binding_defaults(&self) -> BindingDefaults {
        BindingDefaults {
            repeat_interval_ms: self.default_repeat_interval_ms,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path).await
    }

    /// Load configuration from a specific path, writing the defaults there
    /// first when the file does not exist.
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "config file not found, creating default");
            let config = Self::default();
            config.save_to_path(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BridgeConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save configuration to a specific path
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(windows) {
            PathBuf::from(
                std::env::var("LOCALAPPDATA")
                    .context("LOCALAPPDATA environment variable not set")?,
            )
        } else {
            PathBuf::from(std::env::var("HOME").context("HOME environment variable not set")?)
                .join(".config")
        };

        Ok(config_dir.join("tswio").join("config.json"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.schema_version.starts_with("tswio.config/") {
            anyhow::bail!("Invalid schema version: {}", self.schema_version);
        }

        if self.simulator.base_url.trim().is_empty() {
            anyhow::bail!("Simulator base URL is empty");
        }
        check_range("simulator.timeout_ms", self.simulator.timeout_ms, 1, 60_000)?;

        self.analyzer
            .validate()
            .context("Invalid analyzer configuration")?;

        check_range(
            "devices.identity_timeout_ms",
            self.devices.identity_timeout_ms,
            1,
            60_000,
        )?;
        check_range(
            "devices.configure_timeout_ms",
            self.devices.configure_timeout_ms,
            1,
            60_000,
        )?;
        check_range(
            "devices.heartbeat_timeout_ms",
            self.devices.heartbeat_timeout_ms,
            100,
            600_000,
        )?;

        check_range(
            "buttons.default_repeat_interval_ms",
            self.buttons.default_repeat_interval_ms,
            1,
            MAX_REPEAT_INTERVAL_MS,
        )?;

        check_range("outputs.poll_interval_ms", self.outputs.poll_interval_ms, 10, 60_000)?;
        check_range("train.poll_interval_ms", self.train.poll_interval_ms, 100, 60_000)?;
        if self.train.detection_path.trim().is_empty() {
            anyhow::bail!("Train detection path is empty");
        }

        self.logging.validate()?;

        Ok(())
    }
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        anyhow::bail!("Invalid {field}: {value} (expected {min}..={max})");
    }
    Ok(())
}
