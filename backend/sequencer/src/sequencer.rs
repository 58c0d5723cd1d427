//! Sequencer state machine.
//!
//! Pure and synchronous: every mutating call returns the [`Effect`]s the
//! caller must carry out (issue a request, open settings). The async runtime
//! in [`crate::runtime`] is the only caller in production.

use permsheet_config::DismissMode;
use permsheet_core::{
    all_kinds, AuthorizationState, CapabilityProvider, PermissionEntry, PermissionError,
    PermissionKind, RequestOutcome, StatusChange,
};
use tracing::{debug, warn};

use crate::snapshot::SequencerSnapshot;

/// Identifies one issued request. Carries the entry generation at issue
/// time so a result that lost the race against a notification is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub index: usize,
    pub kind: PermissionKind,
    generation: u64,
}

/// Side effect requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Call `request_access` for the ticket's kind and feed the outcome back.
    Request(RequestTicket),
    OpenSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestPhase {
    Idle,
    InFlight,
    /// Prompt shown; the decision arrives on the status-change channel.
    AwaitingNotification,
}

#[derive(Debug, Clone)]
struct Slot {
    entry: PermissionEntry,
    generation: u64,
    phase: RequestPhase,
}

pub struct Sequencer {
    slots: Vec<Slot>,
    cursor: usize,
    modal_visible: bool,
    dismiss_mode: DismissMode,
    revision: u64,
}

impl Sequencer {
    /// Build the session from a live query of every catalog kind.
    ///
    /// Query failures degrade to `Undetermined`.
    pub fn initialize(provider: &dyn CapabilityProvider, dismiss_mode: DismissMode) -> Self {
        let states = all_kinds().into_iter().map(|kind| {
            let state = match provider.query_current_state(kind) {
                Ok(status) => AuthorizationState::from(status),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Status query failed, treating as undetermined");
                    AuthorizationState::Undetermined
                }
            };
            (kind, state)
        });
        Self::from_states(states, dismiss_mode)
    }

    /// Build the session from known states. Kinds missing from `states` start
    /// `Undetermined`; entries are always the full catalog in display order.
    pub fn from_states(
        states: impl IntoIterator<Item = (PermissionKind, AuthorizationState)>,
        dismiss_mode: DismissMode,
    ) -> Self {
        let provided: Vec<_> = states.into_iter().collect();
        let slots = all_kinds()
            .into_iter()
            .map(|kind| {
                let state = provided
                    .iter()
                    .rev()
                    .find(|(k, _)| *k == kind)
                    .map(|(_, s)| *s)
                    .unwrap_or_default();
                Slot {
                    entry: PermissionEntry::new(kind, state),
                    generation: 0,
                    phase: RequestPhase::Idle,
                }
            })
            .collect();

        let mut sequencer = Self {
            slots,
            cursor: 0,
            modal_visible: false,
            dismiss_mode,
            revision: 0,
        };
        sequencer.modal_visible = !sequencer.all_granted();
        sequencer
    }

    /// Auto-advance on mount: focus and request the first undetermined entry.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(first) = self
            .slots
            .iter()
            .position(|s| s.entry.state == AuthorizationState::Undetermined)
        {
            // Cursor starts on the first undetermined entry, not index 0.
            self.cursor = first;
            self.issue_request(first, &mut effects);
        }
        self.touch();
        effects
    }

    /// Whether a completed request would still be applied to its entry.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.slots
            .get(ticket.index)
            .is_some_and(|s| s.generation == ticket.generation)
    }

    /// Ingest the result of a request issued through [`Effect::Request`].
    pub fn on_request_resolved(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<RequestOutcome, PermissionError>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        let current = self.is_current(&ticket);
        let Some(slot) = self.slots.get_mut(ticket.index) else {
            warn!(index = ticket.index, "Request resolved for unknown entry");
            return effects;
        };

        let mut reissue = false;
        match outcome {
            Ok(RequestOutcome::Resolved(status)) => {
                slot.phase = RequestPhase::Idle;
                if current {
                    slot.entry.state = status.into();
                } else {
                    debug!(kind = %ticket.kind, status = %status, "Request result superseded by status change");
                    // A reset arrived while this request was in flight; its
                    // own request was suppressed, so issue it now.
                    reissue = slot.entry.state == AuthorizationState::Undetermined;
                }
            }
            Ok(RequestOutcome::Pending) => {
                slot.phase = if slot.entry.state.is_resolved() {
                    RequestPhase::Idle
                } else {
                    RequestPhase::AwaitingNotification
                };
            }
            Err(e) => {
                warn!(kind = %ticket.kind, error = %e, "Access request failed, entry left unresolved");
                slot.phase = RequestPhase::Idle;
                reissue = !current && slot.entry.state == AuthorizationState::Undetermined;
            }
        }

        if reissue {
            self.issue_request(ticket.index, &mut effects);
        }
        self.step_cursor(&mut effects);
        self.reconcile_modal();
        self.touch();
        effects
    }

    /// Ingest an out-of-band status change. The notification is authoritative.
    pub fn on_external_status_change(&mut self, change: StatusChange) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(index) = self.index_of(change.kind) else {
            return effects;
        };

        let state = AuthorizationState::from(change.status);
        let slot = &mut self.slots[index];
        slot.generation += 1;
        slot.entry.state = state;

        match state {
            AuthorizationState::Undetermined => {
                self.modal_visible = true;
                self.issue_request(index, &mut effects);
            }
            AuthorizationState::Denied => {
                self.modal_visible = true;
                if slot.phase == RequestPhase::AwaitingNotification {
                    slot.phase = RequestPhase::Idle;
                }
            }
            AuthorizationState::Granted => {
                if slot.phase == RequestPhase::AwaitingNotification {
                    slot.phase = RequestPhase::Idle;
                }
            }
        }

        self.reconcile_modal();
        self.touch();
        effects
    }

    /// Re-query every kind and treat any difference as a status change.
    pub fn reconcile_with(&mut self, provider: &dyn CapabilityProvider) -> Vec<Effect> {
        let mut effects = Vec::new();
        for kind in all_kinds() {
            let status = match provider.query_current_state(kind) {
                Ok(status) => status,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Status query failed during resync");
                    continue;
                }
            };
            if self.state_of(kind) != Some(status.into()) {
                effects.extend(self.on_external_status_change(StatusChange { kind, status }));
            }
        }
        effects
    }

    /// User tapped a row. Ignored for out-of-range, resolved, or in-flight entries.
    ///
    /// A row still waiting on its notification is prompted again.
    pub fn retry_request(&mut self, index: usize) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(slot) = self.slots.get_mut(index) else {
            debug!(index, "Retry ignored: index out of range");
            return effects;
        };
        if slot.phase == RequestPhase::AwaitingNotification {
            slot.phase = RequestPhase::Idle;
        }
        if self.issue_request(index, &mut effects) {
            self.touch();
        }
        effects
    }

    /// Hide the sheet. Rejected unless every permission is granted.
    pub fn dismiss(&mut self) -> bool {
        if !self.all_granted() {
            debug!("Dismiss rejected: not all permissions granted");
            return false;
        }
        self.modal_visible = false;
        self.touch();
        true
    }

    /// Settings redirect, available only while some permission is denied.
    pub fn open_system_settings(&self) -> Vec<Effect> {
        if self.any_denied() {
            vec![Effect::OpenSettings]
        } else {
            debug!("Settings redirect ignored: nothing denied");
            Vec::new()
        }
    }

    pub fn all_granted(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.entry.state == AuthorizationState::Granted)
    }

    pub fn any_denied(&self) -> bool {
        self.slots
            .iter()
            .any(|s| s.entry.state == AuthorizationState::Denied)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn modal_visible(&self) -> bool {
        self.modal_visible
    }

    pub fn entries(&self) -> Vec<PermissionEntry> {
        self.slots.iter().map(|s| s.entry).collect()
    }

    pub fn state_of(&self, kind: PermissionKind) -> Option<AuthorizationState> {
        self.index_of(kind).map(|i| self.slots[i].entry.state)
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            entries: self.entries(),
            cursor: self.cursor,
            modal_visible: self.modal_visible,
            all_granted: self.all_granted(),
            any_denied: self.any_denied(),
            can_dismiss: self.all_granted(),
            pending: self
                .slots
                .iter()
                .filter(|s| s.phase != RequestPhase::Idle)
                .map(|s| s.entry.kind)
                .collect(),
            revision: self.revision,
        }
    }

    fn index_of(&self, kind: PermissionKind) -> Option<usize> {
        self.slots.iter().position(|s| s.entry.kind == kind)
    }

    /// Returns false when the entry is resolved or already has a request out.
    fn issue_request(&mut self, index: usize, effects: &mut Vec<Effect>) -> bool {
        let slot = &mut self.slots[index];
        if slot.entry.state.is_resolved() {
            return false;
        }
        if slot.phase != RequestPhase::Idle {
            debug!(kind = %slot.entry.kind, "Request suppressed: one already pending");
            return false;
        }
        slot.phase = RequestPhase::InFlight;
        effects.push(Effect::Request(RequestTicket {
            index,
            kind: slot.entry.kind,
            generation: slot.generation,
        }));
        true
    }

    /// Move forward past resolved entries, stopping at the last one.
    ///
    /// Plain `min(cursor + 1, len - 1)` would park the cursor on a resolved
    /// row and leave later undetermined rows unrequested.
    fn step_cursor(&mut self, effects: &mut Vec<Effect>) {
        let last = self.slots.len() - 1;
        let mut next = (self.cursor + 1).min(last);
        while next < last && self.slots[next].entry.state.is_resolved() {
            next += 1;
        }
        if next != self.cursor {
            self.cursor = next;
            self.advance_if_needed(effects);
        }
    }

    fn advance_if_needed(&mut self, effects: &mut Vec<Effect>) {
        if self.slots[self.cursor].entry.state == AuthorizationState::Undetermined {
            self.issue_request(self.cursor, effects);
        }
    }

    fn reconcile_modal(&mut self) {
        if !self.all_granted() {
            self.modal_visible = true;
        } else if self.dismiss_mode == DismissMode::Auto {
            self.modal_visible = false;
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SimulatedProvider;
    use permsheet_core::ProviderStatus;

    use AuthorizationState::{Denied, Granted, Undetermined};
    use PermissionKind::{Camera, Location, Microphone, PhotoLibrary};

    fn fresh(mode: DismissMode) -> Sequencer {
        Sequencer::from_states([], mode)
    }

    fn ticket(effects: &[Effect]) -> RequestTicket {
        match effects {
            [Effect::Request(t)] => *t,
            other => panic!("expected a single request, got {other:?}"),
        }
    }

    fn resolved(status: ProviderStatus) -> Result<RequestOutcome, PermissionError> {
        Ok(RequestOutcome::Resolved(status))
    }

    fn change(kind: PermissionKind, status: ProviderStatus) -> StatusChange {
        StatusChange { kind, status }
    }

    #[test]
    fn test_entries_cover_catalog_in_display_order() {
        let seq = Sequencer::from_states([(Location, Granted), (Camera, Denied)], DismissMode::Manual);
        let kinds: Vec<_> = seq.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![Camera, Microphone, PhotoLibrary, Location]);
        assert_eq!(seq.state_of(Camera), Some(Denied));
        assert_eq!(seq.state_of(Microphone), Some(Undetermined));
        assert_eq!(seq.state_of(Location), Some(Granted));
    }

    #[test]
    fn test_initialize_queries_provider() {
        let provider = SimulatedProvider::new()
            .with_initial(Camera, ProviderStatus::Authorized)
            .with_initial(PhotoLibrary, ProviderStatus::Limited)
            .with_initial(Location, ProviderStatus::Restricted)
            .failing(Microphone);
        let seq = Sequencer::initialize(&provider, DismissMode::Manual);
        assert_eq!(seq.state_of(Camera), Some(Granted));
        assert_eq!(seq.state_of(Microphone), Some(Undetermined));
        assert_eq!(seq.state_of(PhotoLibrary), Some(Granted));
        assert_eq!(seq.state_of(Location), Some(Denied));
        assert!(seq.modal_visible());
    }

    #[test]
    fn test_all_granted_hides_modal_at_start() {
        let states = all_kinds().map(|k| (k, Granted));
        let mut seq = Sequencer::from_states(states, DismissMode::Manual);
        assert!(!seq.modal_visible());
        assert!(seq.start().is_empty());
    }

    #[test]
    fn test_fresh_session_walks_in_order() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        assert_eq!((t.index, t.kind, seq.cursor()), (0, Camera, 0));

        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Authorized)));
        assert_eq!((t.kind, seq.cursor()), (Microphone, 1));

        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Authorized)));
        assert_eq!((t.kind, seq.cursor()), (PhotoLibrary, 2));

        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Limited)));
        assert_eq!((t.kind, seq.cursor()), (Location, 3));

        let effects = seq.on_request_resolved(t, Ok(RequestOutcome::Pending));
        assert!(effects.is_empty());
        assert_eq!(seq.cursor(), 3);
        assert_eq!(seq.state_of(Location), Some(Undetermined));
        assert_eq!(seq.snapshot().pending, vec![Location]);
        assert!(seq.modal_visible());
        assert!(!seq.all_granted());
    }

    #[test]
    fn test_notification_completes_session_manual_dismiss() {
        let mut seq = Sequencer::from_states(
            [(Camera, Granted), (Microphone, Granted), (PhotoLibrary, Granted)],
            DismissMode::Manual,
        );
        let t = ticket(&seq.start());
        assert_eq!(t.kind, Location);
        seq.on_request_resolved(t, Ok(RequestOutcome::Pending));

        seq.on_external_status_change(change(Location, ProviderStatus::AuthorizedWhenInUse));
        assert!(seq.all_granted());
        assert!(seq.modal_visible());
        assert!(seq.snapshot().pending.is_empty());

        assert!(seq.dismiss());
        assert!(!seq.modal_visible());
    }

    #[test]
    fn test_auto_dismiss_mode_hides_on_all_granted() {
        let mut seq = Sequencer::from_states(
            [(Camera, Granted), (Microphone, Granted), (PhotoLibrary, Granted)],
            DismissMode::Auto,
        );
        seq.on_external_status_change(change(Location, ProviderStatus::AuthorizedAlways));
        assert!(!seq.modal_visible());
    }

    #[test]
    fn test_denied_blocks_dismiss_and_enables_settings() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Denied)));
        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Authorized)));
        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Authorized)));
        seq.on_request_resolved(t, Ok(RequestOutcome::Pending));
        seq.on_external_status_change(change(Location, ProviderStatus::AuthorizedWhenInUse));

        assert!(!seq.all_granted());
        assert!(seq.any_denied());
        assert!(!seq.dismiss());
        assert!(seq.modal_visible());
        assert_eq!(seq.open_system_settings(), vec![Effect::OpenSettings]);
    }

    #[test]
    fn test_settings_unavailable_without_denial() {
        let seq = fresh(DismissMode::Manual);
        assert!(seq.open_system_settings().is_empty());
    }

    #[test]
    fn test_reset_notification_reissues_regardless_of_cursor() {
        let states = all_kinds().map(|k| (k, Granted));
        let mut seq = Sequencer::from_states(states, DismissMode::Manual);
        assert!(seq.dismiss());
        assert_eq!(seq.cursor(), 0);

        let t = ticket(&seq.on_external_status_change(change(Location, ProviderStatus::NotDetermined)));
        assert_eq!((t.index, t.kind), (3, Location));
        assert!(seq.modal_visible());
        assert_eq!(seq.state_of(Location), Some(Undetermined));
    }

    #[test]
    fn test_denied_notification_forces_modal() {
        let states = all_kinds().map(|k| (k, Granted));
        let mut seq = Sequencer::from_states(states, DismissMode::Manual);
        assert!(!seq.modal_visible());
        let effects = seq.on_external_status_change(change(Camera, ProviderStatus::Restricted));
        assert!(effects.is_empty());
        assert!(seq.modal_visible());
        assert_eq!(seq.state_of(Camera), Some(Denied));
    }

    #[test]
    fn test_notification_reconciles_ahead_of_cursor() {
        let mut seq = fresh(DismissMode::Manual);
        seq.start();
        seq.on_external_status_change(change(PhotoLibrary, ProviderStatus::Limited));
        assert_eq!(seq.state_of(PhotoLibrary), Some(Granted));
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn test_cursor_skips_resolved_entries() {
        let mut seq = Sequencer::from_states([(Microphone, Granted)], DismissMode::Manual);
        let t = ticket(&seq.start());
        assert_eq!(t.kind, Camera);
        let t = ticket(&seq.on_request_resolved(t, resolved(ProviderStatus::Authorized)));
        assert_eq!((t.kind, seq.cursor()), (PhotoLibrary, 2));
    }

    #[test]
    fn test_notification_wins_over_stale_request() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        seq.on_external_status_change(change(Camera, ProviderStatus::Authorized));
        assert!(!seq.is_current(&t));

        seq.on_request_resolved(t, resolved(ProviderStatus::Denied));
        assert_eq!(seq.state_of(Camera), Some(Granted));
    }

    #[test]
    fn test_reset_during_inflight_request_reissues_after_completion() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        // Suppressed: the first request is still out.
        assert!(seq
            .on_external_status_change(change(Camera, ProviderStatus::NotDetermined))
            .is_empty());

        let effects = seq.on_request_resolved(t, resolved(ProviderStatus::Authorized));
        assert_eq!(seq.state_of(Camera), Some(Undetermined));
        let kinds: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Request(t) => Some(t.kind),
                Effect::OpenSettings => None,
            })
            .collect();
        assert_eq!(kinds, vec![Camera, Microphone]);
    }

    #[test]
    fn test_failed_stale_request_reissues_after_reset() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        assert!(seq
            .on_external_status_change(change(Camera, ProviderStatus::NotDetermined))
            .is_empty());

        let err = PermissionError::RequestFailed {
            kind: Camera,
            reason: "interrupted".into(),
        };
        let effects = seq.on_request_resolved(t, Err(err));
        let kinds: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Request(t) => Some(t.kind),
                Effect::OpenSettings => None,
            })
            .collect();
        assert_eq!(kinds, vec![Camera, Microphone]);
    }

    #[test]
    fn test_retry_reprompts_row_awaiting_notification() {
        let mut seq = Sequencer::from_states(
            [(Camera, Granted), (Microphone, Granted), (PhotoLibrary, Granted)],
            DismissMode::Manual,
        );
        let t = ticket(&seq.start());
        assert!(seq.on_request_resolved(t, Ok(RequestOutcome::Pending)).is_empty());
        assert_eq!(seq.snapshot().pending, vec![Location]);

        let retry = ticket(&seq.retry_request(3));
        assert_eq!((retry.index, retry.kind), (3, Location));
        // In flight again, so a second tap is suppressed.
        assert!(seq.retry_request(3).is_empty());
    }

    #[test]
    fn test_duplicate_request_suppressed() {
        let mut seq = fresh(DismissMode::Manual);
        seq.start();
        assert!(seq.retry_request(0).is_empty());
    }

    #[test]
    fn test_retry_ignored_for_resolved_and_out_of_range() {
        let mut seq = Sequencer::from_states([(Camera, Granted), (Microphone, Denied)], DismissMode::Manual);
        let before = seq.snapshot();
        assert!(seq.retry_request(0).is_empty());
        assert!(seq.retry_request(1).is_empty());
        assert!(seq.retry_request(42).is_empty());
        assert_eq!(seq.snapshot(), before);
    }

    #[test]
    fn test_failed_request_leaves_row_retryable() {
        let mut seq = fresh(DismissMode::Manual);
        let t = ticket(&seq.start());
        let err = PermissionError::RequestFailed {
            kind: Camera,
            reason: "unreachable".into(),
        };
        let next = ticket(&seq.on_request_resolved(t, Err(err)));
        assert_eq!(next.kind, Microphone);
        assert_eq!(seq.state_of(Camera), Some(Undetermined));

        let retry = ticket(&seq.retry_request(0));
        assert_eq!(retry.kind, Camera);
    }

    #[test]
    fn test_reconcile_with_provider() {
        let provider = SimulatedProvider::new().with_initial(Microphone, ProviderStatus::Denied);
        let mut seq = Sequencer::from_states([(Camera, Granted)], DismissMode::Manual);
        let effects = seq.reconcile_with(&provider);
        // Camera went back to not-determined, so it is requested again.
        assert_eq!(ticket(&effects).kind, Camera);
        assert_eq!(seq.state_of(Microphone), Some(Denied));
    }

    #[test]
    fn test_aggregates_match_entries() {
        let mut seq = fresh(DismissMode::Manual);
        assert!(!seq.all_granted() && !seq.any_denied());
        for kind in all_kinds() {
            seq.on_external_status_change(change(kind, ProviderStatus::Authorized));
        }
        assert!(seq.all_granted() && !seq.any_denied());
        seq.on_external_status_change(change(Microphone, ProviderStatus::Denied));
        assert!(!seq.all_granted() && seq.any_denied());
    }
}
