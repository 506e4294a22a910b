//! Service configuration (`scenekeeper.toml`).
//!
//! Every field has a default, so an empty file or a missing section yields a
//! usable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::geometry::DisplayBand;
use crate::logging::LogConfig;
use crate::parcel::DEFAULT_CAPACITY;
use crate::registry::RegistryPolicy;
use crate::types::{DEFAULT_DISPLAY_ID, DisplayId};

/// Default bound of the serial task queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
/// Default upper bound of one boundary frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LogConfig,
    pub registry: RegistryConfig,
    pub focus: FocusConfig,
    pub transport: TransportConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Vertical bands of the displays. Empty means sessions are matched to
    /// displays by their own display id.
    pub displays: Vec<DisplayBand>,
    /// Ability names of system components allowed into layout enumeration.
    pub layout_whitelist: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            displays: Vec::new(),
            layout_whitelist: vec!["SCBDock".to_string(), "SCBLauncherDock".to_string()],
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            displays: self.displays.clone(),
            layout_whitelist: self.layout_whitelist.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub default_display_id: DisplayId,
    /// Request focus for a session when it enters the foreground.
    pub auto_focus_on_foreground: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_display_id: DEFAULT_DISPLAY_ID,
            auto_focus_on_foreground: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Capacity of request and reply parcels in bytes.
    pub parcel_capacity: usize,
    pub max_frame_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            parcel_capacity: DEFAULT_CAPACITY,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ReadFailed(path.display().to_string(), e.to_string())
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeFailed(e.to_string()).into())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "queue.capacity must be greater than zero".to_string(),
            ));
        }
        if self.transport.parcel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "transport.parcel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.transport.max_frame_len == 0 {
            return Err(ConfigError::ValidationError(
                "transport.max_frame_len must be greater than zero".to_string(),
            ));
        }
        if let Some(band) = self.registry.displays.iter().find(|band| band.top >= band.bottom) {
            return Err(ConfigError::ValidationError(format!(
                "display {} band is inverted (top {} >= bottom {})",
                band.display_id, band.top, band.bottom
            )));
        }
        let mut ids: Vec<DisplayId> = self.registry.displays.iter().map(|b| b.display_id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(ConfigError::ValidationError(
                "registry.displays lists a display id twice".to_string(),
            ));
        }
        self.logging
            .level
            .parse::<crate::logging::LogLevel>()
            .map_err(ConfigError::ValidationError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logging::LogFormat;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.queue.capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.transport.parcel_capacity, 200 * 1024);
        assert!(config.focus.auto_focus_on_foreground);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [registry]
            layout_whitelist = ["SCBDock"]

            [[registry.displays]]
            display_id = 0
            top = 0
            bottom = 1000

            [[registry.displays]]
            display_id = 1
            top = 1000
            bottom = 2000

            [focus]
            auto_focus_on_foreground = false

            [queue]
            capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.registry.displays.len(), 2);
        assert_eq!(config.registry.policy().layout_whitelist, vec!["SCBDock".to_string()]);
        assert!(!config.focus.auto_focus_on_foreground);
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(config.transport.max_frame_len, DEFAULT_MAX_FRAME_LEN);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero = Config::from_toml_str("[queue]\ncapacity = 0\n");
        assert!(matches!(zero, Err(Error::Config(ConfigError::ValidationError(_)))));

        let inverted = Config::from_toml_str(
            "[[registry.displays]]\ndisplay_id = 0\ntop = 10\nbottom = 5\n",
        );
        assert!(matches!(inverted, Err(Error::Config(ConfigError::ValidationError(_)))));

        let level = Config::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(level, Err(Error::Config(ConfigError::ValidationError(_)))));

        let syntax = Config::from_toml_str("[queue\n");
        assert!(matches!(syntax, Err(Error::Config(ConfigError::ParseFailed(_)))));
    }

    #[test]
    fn load_reads_files_and_reports_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            Config::load(&missing),
            Err(Error::Config(ConfigError::FileNotFound(_)))
        ));

        let path = dir.path().join("scenekeeper.toml");
        std::fs::write(&path, "[focus]\ndefault_display_id = 3\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.focus.default_display_id, 3);
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
