//! Console configuration
//!
//! Configuration is organized into logical sections:
//! - Connection settings (port, baud rate, read timeout)
//! - Poll cycle settings (display refresh cadence, plot length)
//! - Frame relay settings (channel capacity, overflow policy)
//! - Snapshot settings (output directory)
//!
//! Files may be JSON or TOML; the format follows the file extension.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use spiderbot_communication::{BaudRate, ConnectionParams};
use spiderbot_core::OverflowPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "spiderbot";

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Last used port; empty when none was chosen
    pub port: String,
    /// Line speed
    pub baud_rate: BaudRate,
    /// Upper bound on a single blocking read in milliseconds
    pub read_timeout_ms: u64,
    /// Connect to `port` on startup
    pub auto_connect: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: BaudRate::B9600,
            read_timeout_ms: 1000,
            auto_connect: false,
        }
    }
}

impl ConnectionSettings {
    /// Link parameters for the configured port
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams::new(&self.port, self.baud_rate)
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
    }
}

/// Display poll cycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Refresh period in milliseconds
    pub interval_ms: u64,
    /// Number of samples in the distance plot
    pub history_len: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 30,
            history_len: 50,
        }
    }
}

impl PollSettings {
    /// Refresh period
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Frame relay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Frames buffered per stream
    pub capacity: usize,
    /// Behaviour when a stream's channel is full
    pub overflow: OverflowPolicy,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            capacity: 1,
            overflow: OverflowPolicy::EvictOldest,
        }
    }
}

/// Snapshot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Output directory, relative to the working directory unless absolute
    pub directory: PathBuf,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("snapshots"),
        }
    }
}

/// Complete console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Poll cycle settings
    pub poll: PollSettings,
    /// Frame relay settings
    pub frames: FrameSettings,
    /// Snapshot settings
    pub snapshot: SnapshotSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<platform config dir>/spiderbot/config.json`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join("config.json"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load config, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = format_of(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.read_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.read_timeout_ms",
                "must be > 0",
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(SettingsError::invalid("poll.interval_ms", "must be > 0"));
        }

        if self.poll.history_len == 0 {
            return Err(SettingsError::invalid("poll.history_len", "must be > 0"));
        }

        if self.frames.capacity == 0 {
            return Err(SettingsError::invalid("frames.capacity", "must be > 0"));
        }

        if self.snapshot.directory.as_os_str().is_empty() {
            return Err(SettingsError::invalid(
                "snapshot.directory",
                "must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll.interval(), Duration::from_millis(30));
        assert_eq!(config.connection.baud_rate, BaudRate::B9600);
        assert_eq!(config.frames.capacity, 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.poll.interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_connection_params_from_settings() {
        let settings = ConnectionSettings {
            port: "COM5".to_string(),
            baud_rate: BaudRate::B115200,
            read_timeout_ms: 250,
            auto_connect: true,
        };
        let params = settings.params();
        assert_eq!(params.port, "COM5");
        assert_eq!(params.baud_rate, BaudRate::B115200);
        assert_eq!(params.read_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            Config::load_from_file(Path::new("config.yaml")),
            Err(SettingsError::UnsupportedFormat(_))
        ));
    }
}
