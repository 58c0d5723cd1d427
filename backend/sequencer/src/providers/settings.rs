use std::sync::atomic::{AtomicUsize, Ordering};

use permsheet_core::{PermissionError, SettingsNavigator};
use tracing::info;

/// A settings navigator that logs and counts redirects instead of leaving the app.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    opened: AtomicUsize,
    unavailable: bool,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every redirect fails, as on a host without a settings app.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Redirects attempted, including failed ones.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SettingsNavigator for RecordingNavigator {
    fn open_external_settings(&self) -> Result<(), PermissionError> {
        let count = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        if self.unavailable {
            return Err(PermissionError::SettingsUnavailable(
                "no settings app on this host".to_string(),
            ));
        }
        info!(count, "Opening system settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_redirects() {
        let navigator = RecordingNavigator::new();
        navigator.open_external_settings().unwrap();
        navigator.open_external_settings().unwrap();
        assert_eq!(navigator.open_count(), 2);
    }

    #[test]
    fn test_unavailable_navigator_fails() {
        let navigator = RecordingNavigator::unavailable();
        let err = navigator.open_external_settings().unwrap_err();
        assert!(matches!(err, PermissionError::SettingsUnavailable(_)));
        assert_eq!(navigator.open_count(), 1);
    }
}
