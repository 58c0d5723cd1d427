use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::catalog::PermissionKind;
use crate::error::PermissionError;
use crate::state::{ProviderStatus, RequestOutcome, StatusChange};

/// The OS-level permission API surface, one implementation per platform.
#[async_trait]
pub trait CapabilityProvider: Send + Sync + 'static {
    /// Provider name for logs (e.g. "ios", "simulated").
    fn name(&self) -> &str;

    /// Read the recorded decision for `kind` without prompting the user.
    fn query_current_state(&self, kind: PermissionKind) -> Result<ProviderStatus, PermissionError>;

    /// Prompt the user for `kind`.
    ///
    /// Shows at most one native dialog, and only when the status is still
    /// `NotDetermined`; otherwise returns the current status untouched. Kinds
    /// whose decision is delivered asynchronously return `Pending`.
    async fn request_access(&self, kind: PermissionKind) -> Result<RequestOutcome, PermissionError>;

    /// Subscribe to out-of-band status changes. One subscription per session.
    fn status_changes(&self) -> broadcast::Receiver<StatusChange>;
}

/// Opens the app's page in the system settings. Fire-and-forget.
pub trait SettingsNavigator: Send + Sync + 'static {
    fn open_external_settings(&self) -> Result<(), PermissionError>;
}
