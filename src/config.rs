//! Configuration for the activity tracker.

use crate::session::TrackingMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the session CSV files
    pub data_path: PathBuf,

    /// Minimum time between event-triggered saves
    #[serde(with = "duration_serde")]
    pub autosave_interval: Duration,

    /// Which input sources to capture
    pub sources: SourceConfig,

    /// How events are tagged with an application
    #[serde(default)]
    pub mode: TrackingMode,

    /// Whether recording is currently paused
    #[serde(default)]
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-tracker")
            .join("activity_data");

        Self {
            data_path: data_dir,
            autosave_interval: Duration::from_secs(30),
            sources: SourceConfig::default(),
            mode: TrackingMode::AppSpecific,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-tracker")
            .join("config.json")
    }

    /// Sources to capture: a `--sources` list when given, else the configured ones.
    pub fn sources_or(&self, flag: Option<&str>) -> SourceConfig {
        flag.map(SourceConfig::from_csv)
            .unwrap_or_else(|| self.sources.clone())
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration for which input sources to capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub keyboard: bool,
    pub mouse: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            keyboard: sources.iter().any(|s| s == "keyboard" || s == "all"),
            mouse: sources.iter().any(|s| s == "mouse" || s == "all"),
        }
    }

    /// Check if at least one source is enabled.
    pub fn any_enabled(&self) -> bool {
        self.keyboard || self.mouse
    }
}

/// Last `paused`/`mode` values a running tracker read from the config file.
///
/// Changes are reported against the previous file contents, never against the
/// tracker's effective state, so command-line overrides survive polling until
/// another process actually edits the file.
#[derive(Debug, Clone, Copy)]
pub struct ConfigWatch {
    paused: bool,
    mode: TrackingMode,
}

/// Settings that changed between two reads of the config file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChanges {
    pub paused: Option<bool>,
    pub mode: Option<TrackingMode>,
}

impl ConfigWatch {
    pub fn new(config: &Config) -> Self {
        Self {
            paused: config.paused,
            mode: config.mode,
        }
    }

    /// Record a fresh read and return what differs from the previous one.
    pub fn update(&mut self, config: &Config) -> ConfigChanges {
        let mut changes = ConfigChanges::default();
        if config.paused != self.paused {
            self.paused = config.paused;
            changes.paused = Some(config.paused);
        }
        if config.mode != self.mode {
            self.mode = config.mode;
            changes.mode = Some(config.mode);
        }
        changes
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_parsing() {
        let config = SourceConfig::from_csv("keyboard,mouse");
        assert!(config.keyboard);
        assert!(config.mouse);

        let config = SourceConfig::from_csv("keyboard");
        assert!(config.keyboard);
        assert!(!config.mouse);

        let config = SourceConfig::from_csv("all");
        assert!(config.any_enabled());

        let config = SourceConfig::from_csv("trackpad");
        assert!(!config.any_enabled());
    }

    #[test]
    fn test_sources_flag_overrides_config() {
        let mut config = Config::default();
        config.sources = SourceConfig {
            keyboard: false,
            mouse: true,
        };

        let sources = config.sources_or(None);
        assert!(!sources.keyboard);
        assert!(sources.mouse);

        let sources = config.sources_or(Some("keyboard"));
        assert!(sources.keyboard);
        assert!(!sources.mouse);
    }

    #[test]
    fn test_unchanged_config_reports_nothing() {
        // `start --global` with no config file: the default says app mode,
        // and rereading that same default must not switch the tracker back.
        let config = Config::default();
        let mut watch = ConfigWatch::new(&config);

        assert_eq!(watch.update(&Config::default()), ConfigChanges::default());
        assert_eq!(watch.update(&Config::default()), ConfigChanges::default());
    }

    #[test]
    fn test_config_edits_are_reported_once() {
        let mut watch = ConfigWatch::new(&Config::default());

        let mut edited = Config::default();
        edited.mode = TrackingMode::Global;
        edited.paused = true;
        let changes = watch.update(&edited);
        assert_eq!(changes.mode, Some(TrackingMode::Global));
        assert_eq!(changes.paused, Some(true));

        assert_eq!(watch.update(&edited), ConfigChanges::default());

        edited.mode = TrackingMode::AppSpecific;
        let changes = watch.update(&edited);
        assert_eq!(changes.mode, Some(TrackingMode::AppSpecific));
        assert_eq!(changes.paused, None);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.autosave_interval, Duration::from_secs(30));
        assert!(config.data_path.ends_with("activity_data"));
        assert_eq!(config.mode, TrackingMode::AppSpecific);
        assert!(!config.paused);
    }

    #[test]
    fn test_config_json_shape() {
        let mut config = Config::default();
        config.mode = TrackingMode::Global;
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["autosave_interval"], 30);
        assert_eq!(json["mode"], "global");

        let parsed: Config = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.mode, TrackingMode::Global);
    }

    #[test]
    fn test_older_config_without_mode() {
        let json = r#"{
            "data_path": "/tmp/activity",
            "autosave_interval": 60,
            "sources": { "keyboard": true, "mouse": false }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, TrackingMode::AppSpecific);
        assert!(!config.paused);
        assert_eq!(config.autosave_interval, Duration::from_secs(60));
    }
}
