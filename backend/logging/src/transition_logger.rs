//! Sequencer Transition Logger
//!
//! One structured `tracing` event per sequencer transition, on a dedicated
//! target so subscribers can route or filter them.

use chrono::{DateTime, Utc};
use permsheet_core::{AuthorizationState, PermissionKind, ProviderStatus};
use serde::Serialize;
use tracing::info;

pub const TRANSITION_TARGET: &str = "permission_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SheetEvent {
    SessionStarted {
        undetermined: usize,
        modal_visible: bool,
    },
    RequestIssued {
        kind: PermissionKind,
        index: usize,
    },
    RequestResolved {
        kind: PermissionKind,
        state: AuthorizationState,
        /// False when a newer external notification already decided the entry.
        applied: bool,
    },
    RequestPending {
        kind: PermissionKind,
    },
    RequestFailed {
        kind: PermissionKind,
        error: String,
    },
    ExternalChange {
        kind: PermissionKind,
        status: ProviderStatus,
    },
    IntentIgnored {
        intent: String,
        reason: String,
    },
    Dismissed,
    SettingsOpened,
    SessionEnded,
}

#[derive(Debug, Serialize)]
pub struct TransitionLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: SheetEvent,
}

pub struct TransitionLogger;

impl TransitionLogger {
    /// Build the entry for a transition without emitting it.
    pub fn entry(session_id: &str, event: SheetEvent) -> TransitionLogEntry {
        TransitionLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Emit a transition as NDJSON-friendly structured event.
    pub fn log(session_id: &str, event: SheetEvent) {
        let entry = Self::entry(session_id, event);
        let payload = serde_json::to_string(&entry.event).unwrap_or_default();
        info!(
            target: TRANSITION_TARGET,
            session_id = %entry.session_id,
            timestamp = %entry.timestamp.to_rfc3339(),
            event = %payload,
            "Permission sheet transition"
        );
    }
}
