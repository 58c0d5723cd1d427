//! Config validation with field paths.

use crate::schema::{DismissMode, SheetConfig};
use thiserror::Error;

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &SheetConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.event_queue_capacity == 0 {
        report.error("eventQueueCapacity", "Event queue capacity must be at least 1");
    }

    if config.dismiss_mode == DismissMode::Auto {
        report.warn(
            "dismissMode",
            "Sheet hides itself on all-granted; the completed sheet is never shown",
        );
    }

    validate_level(&config.logging.level, &mut report);
    report
}

/// Accepts a bare level or a comma-separated list of `target=level` directives.
fn validate_level(level: &str, report: &mut ValidationReport) {
    if level.trim().is_empty() {
        report.error("logging.level", "Log level cannot be empty");
        return;
    }
    for directive in level.split(',') {
        let lvl = directive.rsplit('=').next().unwrap_or(directive).trim();
        if !LEVELS.contains(&lvl.to_ascii_lowercase().as_str()) {
            report.error("logging.level", format!("Unknown log level {lvl:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let report = validate(&SheetConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_capacity_is_error() {
        let config = SheetConfig {
            event_queue_capacity: 0,
            ..Default::default()
        };
        let report = validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "eventQueueCapacity");
    }

    #[test]
    fn auto_dismiss_warns() {
        let config = SheetConfig {
            dismiss_mode: DismissMode::Auto,
            ..Default::default()
        };
        let report = validate(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn level_directives() {
        let mut config = SheetConfig::default();
        config.logging.level = "info,permsheet_sequencer=debug".to_string();
        assert!(validate(&config).is_valid());

        config.logging.level = "loud".to_string();
        let report = validate(&config);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "logging.level");
    }
}
