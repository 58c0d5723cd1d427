//! Single-writer event loop around the [`Sequencer`].
//!
//! Request completions, forwarded status changes, and user intents are
//! funneled through one bounded mpsc queue and applied in arrival order by
//! a single Tokio task. Snapshots go out on a watch channel.

use std::fmt;
use std::sync::Arc;

use permsheet_config::SheetConfig;
use permsheet_core::{
    AuthorizationState, CapabilityProvider, PermissionError, RequestOutcome, SettingsNavigator,
    StatusChange,
};
use permsheet_logging::{SheetEvent, TransitionLogger};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sequencer::{Effect, RequestTicket, Sequencer};
use crate::snapshot::SequencerSnapshot;

/// Actions the presentation layer may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    /// Row tapped: request the permission at this index again.
    Retry(usize),
    Dismiss,
    OpenSettings,
}

impl fmt::Display for UserIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserIntent::Retry(index) => write!(f, "retry({index})"),
            UserIntent::Dismiss => f.write_str("dismiss"),
            UserIntent::OpenSettings => f.write_str("open_settings"),
        }
    }
}

enum SequencerEvent {
    RequestCompleted {
        ticket: RequestTicket,
        outcome: Result<RequestOutcome, PermissionError>,
    },
    StatusChanged(StatusChange),
    /// Notifications were dropped; re-query the provider.
    Resync,
    Intent {
        intent: UserIntent,
        ack: oneshot::Sender<bool>,
    },
    Shutdown,
}

pub struct SequencerRuntime {
    sequencer: Sequencer,
    provider: Arc<dyn CapabilityProvider>,
    navigator: Arc<dyn SettingsNavigator>,
    events_tx: mpsc::WeakSender<SequencerEvent>,
    events_rx: mpsc::Receiver<SequencerEvent>,
    snapshot_tx: watch::Sender<SequencerSnapshot>,
    session_id: String,
}

impl SequencerRuntime {
    /// Start a session: subscribe to status changes, query every kind, and
    /// spawn the event loop. Must be called inside a Tokio runtime.
    pub fn spawn(
        provider: Arc<dyn CapabilityProvider>,
        navigator: Arc<dyn SettingsNavigator>,
        config: &SheetConfig,
    ) -> SequencerHandle {
        let session_id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_capacity.max(1));

        // Subscribe before querying so no change slips between the two.
        let status_rx = provider.status_changes();
        let sequencer = Sequencer::initialize(provider.as_ref(), config.dismiss_mode);
        let (snapshot_tx, snapshot_rx) = watch::channel(sequencer.snapshot());

        let forwarder = tokio::spawn(forward_status_changes(status_rx, events_tx.downgrade()));

        info!(
            session_id = %session_id,
            provider = provider.name(),
            dismiss_mode = %config.dismiss_mode,
            "Permission session started"
        );

        let runtime = Self {
            sequencer,
            provider,
            navigator,
            events_tx: events_tx.downgrade(),
            events_rx,
            snapshot_tx,
            session_id: session_id.to_string(),
        };
        tokio::spawn(runtime.run(forwarder));

        SequencerHandle {
            tx: events_tx,
            snapshot_rx,
            session_id,
        }
    }

    async fn run(mut self, forwarder: JoinHandle<()>) {
        let effects = self.sequencer.start();
        let undetermined = self
            .sequencer
            .entries()
            .iter()
            .filter(|e| e.state == AuthorizationState::Undetermined)
            .count();
        TransitionLogger::log(
            &self.session_id,
            SheetEvent::SessionStarted {
                undetermined,
                modal_visible: self.sequencer.modal_visible(),
            },
        );
        self.execute(effects);
        self.publish();

        // Ends on shutdown, or once every handle and in-flight request is gone.
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, SequencerEvent::Shutdown) {
                debug!("Shutdown requested");
                break;
            }
            self.handle(event);
            self.publish();
        }

        forwarder.abort();
        TransitionLogger::log(&self.session_id, SheetEvent::SessionEnded);
        info!(session_id = %self.session_id, "Permission session ended");
    }

    fn handle(&mut self, event: SequencerEvent) {
        match event {
            SequencerEvent::RequestCompleted { ticket, outcome } => {
                let applied = self.sequencer.is_current(&ticket);
                let transition = match &outcome {
                    Ok(RequestOutcome::Resolved(status)) => SheetEvent::RequestResolved {
                        kind: ticket.kind,
                        state: (*status).into(),
                        applied,
                    },
                    Ok(RequestOutcome::Pending) => SheetEvent::RequestPending { kind: ticket.kind },
                    Err(e) => SheetEvent::RequestFailed {
                        kind: ticket.kind,
                        error: e.to_string(),
                    },
                };
                TransitionLogger::log(&self.session_id, transition);
                let effects = self.sequencer.on_request_resolved(ticket, outcome);
                self.execute(effects);
            }
            SequencerEvent::StatusChanged(change) => {
                TransitionLogger::log(
                    &self.session_id,
                    SheetEvent::ExternalChange {
                        kind: change.kind,
                        status: change.status,
                    },
                );
                let effects = self.sequencer.on_external_status_change(change);
                self.execute(effects);
            }
            SequencerEvent::Resync => {
                let effects = self.sequencer.reconcile_with(self.provider.as_ref());
                self.execute(effects);
            }
            SequencerEvent::Intent { intent, ack } => {
                let accepted = self.apply_intent(intent);
                if !accepted {
                    TransitionLogger::log(
                        &self.session_id,
                        SheetEvent::IntentIgnored {
                            intent: intent.to_string(),
                            reason: self.rejection_reason(intent).to_string(),
                        },
                    );
                }
                let _ = ack.send(accepted);
            }
            SequencerEvent::Shutdown => {}
        }
    }

    fn apply_intent(&mut self, intent: UserIntent) -> bool {
        match intent {
            UserIntent::Retry(index) => {
                let effects = self.sequencer.retry_request(index);
                let accepted = !effects.is_empty();
                self.execute(effects);
                accepted
            }
            UserIntent::Dismiss => {
                let dismissed = self.sequencer.dismiss();
                if dismissed {
                    TransitionLogger::log(&self.session_id, SheetEvent::Dismissed);
                }
                dismissed
            }
            UserIntent::OpenSettings => {
                let effects = self.sequencer.open_system_settings();
                let accepted = !effects.is_empty();
                self.execute(effects);
                accepted
            }
        }
    }

    fn rejection_reason(&self, intent: UserIntent) -> &'static str {
        match intent {
            UserIntent::Retry(index) if index >= self.sequencer.entries().len() => "index out of range",
            UserIntent::Retry(_) => "entry resolved or request pending",
            UserIntent::Dismiss => "not all permissions granted",
            UserIntent::OpenSettings => "no permission denied",
        }
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(ticket) => self.spawn_request(ticket),
                Effect::OpenSettings => {
                    TransitionLogger::log(&self.session_id, SheetEvent::SettingsOpened);
                    if let Err(e) = self.navigator.open_external_settings() {
                        warn!(error = %e, "Failed to open system settings");
                    }
                }
            }
        }
    }

    fn spawn_request(&self, ticket: RequestTicket) {
        let Some(tx) = self.events_tx.upgrade() else {
            debug!(kind = %ticket.kind, "Session closing, request not issued");
            return;
        };
        TransitionLogger::log(
            &self.session_id,
            SheetEvent::RequestIssued {
                kind: ticket.kind,
                index: ticket.index,
            },
        );
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            let outcome = provider.request_access(ticket.kind).await;
            if tx
                .send(SequencerEvent::RequestCompleted { ticket, outcome })
                .await
                .is_err()
            {
                debug!(kind = %ticket.kind, "Session ended before request completed");
            }
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.sequencer.snapshot());
    }
}

async fn forward_status_changes(
    mut status_rx: broadcast::Receiver<StatusChange>,
    events_tx: mpsc::WeakSender<SequencerEvent>,
) {
    loop {
        let event = match status_rx.recv().await {
            Ok(change) => SequencerEvent::StatusChanged(change),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Status notifications dropped, resyncing");
                SequencerEvent::Resync
            }
            Err(RecvError::Closed) => {
                debug!("Status channel closed");
                break;
            }
        };
        let Some(tx) = events_tx.upgrade() else {
            break;
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}

/// Cloneable handle held by the presentation layer.
///
/// Dropping every handle ends the session once in-flight requests finish.
#[derive(Clone)]
pub struct SequencerHandle {
    tx: mpsc::Sender<SequencerEvent>,
    snapshot_rx: watch::Receiver<SequencerSnapshot>,
    session_id: Uuid,
}

impl SequencerHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SequencerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SequencerSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SequencerSnapshot) -> bool,
    ) -> Result<SequencerSnapshot, PermissionError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| PermissionError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Returns whether a new request was issued.
    pub async fn retry_request(&self, index: usize) -> Result<bool, PermissionError> {
        self.send_intent(UserIntent::Retry(index)).await
    }

    /// Returns whether the sheet was hidden.
    pub async fn dismiss(&self) -> Result<bool, PermissionError> {
        self.send_intent(UserIntent::Dismiss).await
    }

    /// Returns whether the settings redirect was performed.
    pub async fn open_system_settings(&self) -> Result<bool, PermissionError> {
        self.send_intent(UserIntent::OpenSettings).await
    }

    pub async fn send_intent(&self, intent: UserIntent) -> Result<bool, PermissionError> {
        let (ack, ack_rx) = oneshot::channel();
        self.tx
            .send(SequencerEvent::Intent { intent, ack })
            .await
            .map_err(|_| PermissionError::SessionClosed)?;
        ack_rx.await.map_err(|_| PermissionError::SessionClosed)
    }

    /// End the session and wait for the event loop to exit.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SequencerEvent::Shutdown).await;
        let mut rx = self.snapshot_rx.clone();
        while rx.changed().await.is_ok() {}
    }
}
