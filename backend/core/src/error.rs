use thiserror::Error;

use crate::catalog::PermissionKind;

/// Top-level error type for the permission sheet.
///
/// Denials are not errors: a `Denied` authorization is an ordinary value.
/// These variants cover the failure-like conditions around the OS layer.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("capability provider unavailable for {kind}: {reason}")]
    ProviderUnavailable { kind: PermissionKind, reason: String },

    #[error("access request for {kind} failed: {reason}")]
    RequestFailed { kind: PermissionKind, reason: String },

    #[error("system settings unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("unknown permission kind: {0:?}")]
    UnknownPermission(String),

    #[error("unknown authorization status: {0:?}")]
    UnknownStatus(String),

    #[error("permission session closed")]
    SessionClosed,
}
