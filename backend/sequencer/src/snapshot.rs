use permsheet_core::{AuthorizationState, PermissionEntry, PermissionKind};
use serde::{Deserialize, Serialize};

/// Immutable view of the sequencer published after every processed event.
///
/// The presentation layer renders this and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    /// One entry per catalog kind, in display order.
    pub entries: Vec<PermissionEntry>,
    pub cursor: usize,
    pub modal_visible: bool,
    pub all_granted: bool,
    pub any_denied: bool,
    /// Whether the dismiss action is unblocked.
    pub can_dismiss: bool,
    /// Kinds with a request in flight or awaiting its notification.
    pub pending: Vec<PermissionKind>,
    pub revision: u64,
}

impl SequencerSnapshot {
    pub fn state_of(&self, kind: PermissionKind) -> Option<AuthorizationState> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| e.state)
    }

    pub fn is_pending(&self, kind: PermissionKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Every entry has left `Undetermined`.
    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|e| e.state.is_resolved())
    }

    /// Labels of granted permissions, in display order.
    pub fn granted_labels(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.state == AuthorizationState::Granted)
            .map(|e| e.kind.label())
            .collect()
    }

    /// Symbol token for the sheet header.
    pub fn header_badge(&self) -> &'static str {
        if self.all_granted {
            "person.badge.shield.checkmark"
        } else {
            "person.badge.shield.exclamationmark"
        }
    }
}

/// Symbol token for a row's status indicator.
pub fn row_glyph(state: AuthorizationState) -> &'static str {
    match state {
        AuthorizationState::Granted => "checkmark.circle.fill",
        AuthorizationState::Denied => "xmark.circle.fill",
        AuthorizationState::Undetermined => "questionmark.circle.fill",
    }
}
