//! Permission sheet configuration schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default bound of the sequencer's ordered event queue.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetConfig {
    /// Who hides the sheet once every permission is granted.
    pub dismiss_mode: DismissMode,

    /// Capacity of the single ordered event queue feeding the sequencer.
    pub event_queue_capacity: usize,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            dismiss_mode: DismissMode::default(),
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            logging: LoggingConfig::default(),
        }
    }
}

/// Dismissal policy once all permissions are granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissMode {
    /// The user must press the dismiss button; all-granted only unblocks it.
    #[default]
    Manual,
    /// The sheet hides itself as soon as all-granted is reached.
    Auto,
}

impl FromStr for DismissMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(DismissMode::Manual),
            "auto" => Ok(DismissMode::Auto),
            other => Err(format!("expected 'manual' or 'auto', got {other:?}")),
        }
    }
}

impl fmt::Display for DismissMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DismissMode::Manual => f.write_str("manual"),
            DismissMode::Auto => f.write_str("auto"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "permsheet_sequencer=debug".
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily-rolling NDJSON logs. Console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SheetConfig::default();
        assert_eq!(config.dismiss_mode, DismissMode::Manual);
        assert_eq!(config.event_queue_capacity, DEFAULT_EVENT_QUEUE_CAPACITY);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: SheetConfig = serde_yaml::from_str("dismissMode: auto\n").unwrap();
        assert_eq!(config.dismiss_mode, DismissMode::Auto);
        assert_eq!(config.event_queue_capacity, DEFAULT_EVENT_QUEUE_CAPACITY);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_nested_logging_yaml() {
        let yaml = "logging:\n  level: debug\n  format: json\n  dir: /tmp/permsheet\n";
        let config: SheetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.dir, Some(PathBuf::from("/tmp/permsheet")));
    }

    #[test]
    fn test_dismiss_mode_parse() {
        assert_eq!("AUTO".parse::<DismissMode>().unwrap(), DismissMode::Auto);
        assert!("sometimes".parse::<DismissMode>().is_err());
    }
}
