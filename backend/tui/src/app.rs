//! Sheet View State
//!
//! The latest sequencer snapshot plus the purely local UI state: which row
//! is selected, a one-line status message, and the quit flag.

use permsheet_core::{AuthorizationState, PermissionKind};
use permsheet_sequencer::{row_glyph, SequencerSnapshot};

pub const SHEET_TITLE: &str = "Required Permissions";
pub const DISMISS_LABEL: &str = "Start using the App";
pub const SETTINGS_LABEL: &str = "Go to settings";

/// One rendered row of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub kind: PermissionKind,
    pub label: &'static str,
    pub icon: &'static str,
    pub state: AuthorizationState,
    pub glyph: &'static str,
    pub pending: bool,
    pub focused: bool,
}

pub struct SheetView {
    pub snapshot: SequencerSnapshot,
    pub selected: usize,
    pub status_line: Option<String>,
    pub should_quit: bool,
}

impl SheetView {
    /// Selection starts on the sequencer cursor.
    pub fn from_snapshot(snapshot: &SequencerSnapshot) -> Self {
        Self {
            snapshot: snapshot.clone(),
            selected: snapshot.cursor,
            status_line: None,
            should_quit: false,
        }
    }

    pub fn update(&mut self, snapshot: &SequencerSnapshot) {
        self.snapshot = snapshot.clone();
        let last = self.snapshot.entries.len().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.snapshot.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = Some(message.into());
    }

    pub fn rows(&self) -> Vec<RowView> {
        self.snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| RowView {
                kind: entry.kind,
                label: entry.kind.label(),
                icon: entry.kind.icon_token(),
                state: entry.state,
                glyph: row_glyph(entry.state),
                pending: self.snapshot.is_pending(entry.kind),
                focused: index == self.snapshot.cursor,
            })
            .collect()
    }
}
