//! Scriptable capability provider.
//!
//! Stands in for the OS permission APIs in tests and in the CLI simulator.
//! Each kind has a current status, the answer the "user" gives when
//! prompted, and whether its decision arrives through the status-change
//! channel (Location by default) rather than as the request's return value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use permsheet_core::{
    all_kinds, CapabilityProvider, PermissionError, PermissionKind, ProviderStatus, RequestOutcome,
    StatusChange,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
struct KindScript {
    current: ProviderStatus,
    /// `None` leaves the prompt unanswered.
    answer: Option<ProviderStatus>,
    deferred: bool,
    failing: bool,
    prompts: usize,
}

type Scripts = Arc<Mutex<HashMap<PermissionKind, KindScript>>>;

pub struct SimulatedProvider {
    scripts: Scripts,
    changes: broadcast::Sender<StatusChange>,
    delay: Duration,
}

impl SimulatedProvider {
    /// Every kind undetermined and answered with a grant; Location deferred.
    pub fn new() -> Self {
        let scripts = all_kinds()
            .into_iter()
            .map(|kind| {
                let location = kind == PermissionKind::Location;
                let answer = if location {
                    ProviderStatus::AuthorizedWhenInUse
                } else {
                    ProviderStatus::Authorized
                };
                let script = KindScript {
                    current: ProviderStatus::NotDetermined,
                    answer: Some(answer),
                    deferred: location,
                    failing: false,
                    prompts: 0,
                };
                (kind, script)
            })
            .collect();
        let (changes, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            changes,
            delay: Duration::ZERO,
        }
    }

    /// Status recorded before the session starts.
    pub fn with_initial(self, kind: PermissionKind, status: ProviderStatus) -> Self {
        self.update(kind, |s| s.current = status);
        self
    }

    /// What the user picks when prompted for `kind`.
    pub fn with_answer(self, kind: PermissionKind, status: ProviderStatus) -> Self {
        self.update(kind, |s| s.answer = Some(status));
        self
    }

    /// Leave the prompt for `kind` unanswered.
    pub fn holding(self, kind: PermissionKind) -> Self {
        self.update(kind, |s| s.answer = None);
        self
    }

    pub fn deferred(self, kind: PermissionKind, deferred: bool) -> Self {
        self.update(kind, |s| s.deferred = deferred);
        self
    }

    pub fn failing(self, kind: PermissionKind) -> Self {
        self.set_failing(kind, true);
        self
    }

    /// Time the simulated user takes to answer a prompt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        self.changes = changes;
        self
    }

    pub fn set_failing(&self, kind: PermissionKind, failing: bool) {
        self.update(kind, |s| s.failing = failing);
    }

    /// Simulate the user flipping `kind` in the system settings app.
    pub fn set_status_externally(&self, kind: PermissionKind, status: ProviderStatus) {
        self.update(kind, |s| s.current = status);
        info!(kind = %kind, status = %status, "Simulated settings change");
        let _ = self.changes.send(StatusChange { kind, status });
    }

    /// Number of native dialogs shown for `kind`.
    pub fn prompt_count(&self, kind: PermissionKind) -> usize {
        lock(&self.scripts).get(&kind).map_or(0, |s| s.prompts)
    }

    pub fn current(&self, kind: PermissionKind) -> ProviderStatus {
        lock(&self.scripts)
            .get(&kind)
            .map_or(ProviderStatus::NotDetermined, |s| s.current)
    }

    fn update(&self, kind: PermissionKind, f: impl FnOnce(&mut KindScript)) {
        if let Some(script) = lock(&self.scripts).get_mut(&kind) {
            f(script);
        }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(scripts: &Scripts) -> MutexGuard<'_, HashMap<PermissionKind, KindScript>> {
    scripts.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl CapabilityProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    fn query_current_state(&self, kind: PermissionKind) -> Result<ProviderStatus, PermissionError> {
        let scripts = lock(&self.scripts);
        match scripts.get(&kind) {
            Some(script) if !script.failing => Ok(script.current),
            _ => Err(PermissionError::ProviderUnavailable {
                kind,
                reason: "simulated outage".to_string(),
            }),
        }
    }

    async fn request_access(&self, kind: PermissionKind) -> Result<RequestOutcome, PermissionError> {
        let (deferred, answer) = {
            let mut scripts = lock(&self.scripts);
            let script = scripts
                .get_mut(&kind)
                .filter(|s| !s.failing)
                .ok_or_else(|| PermissionError::RequestFailed {
                    kind,
                    reason: "simulated outage".to_string(),
                })?;
            if script.current != ProviderStatus::NotDetermined {
                debug!(kind = %kind, status = %script.current, "Already decided, no prompt");
                return Ok(RequestOutcome::Resolved(script.current));
            }
            script.prompts += 1;
            (script.deferred, script.answer)
        };

        debug!(kind = %kind, deferred, "Prompting");

        if deferred {
            if let Some(answer) = answer {
                let scripts = Arc::clone(&self.scripts);
                let changes = self.changes.clone();
                let delay = self.delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(script) = lock(&scripts).get_mut(&kind) {
                        script.current = answer;
                    }
                    let _ = changes.send(StatusChange { kind, status: answer });
                });
            }
            return Ok(RequestOutcome::Pending);
        }

        tokio::time::sleep(self.delay).await;
        let answer = answer.unwrap_or(ProviderStatus::NotDetermined);
        if let Some(script) = lock(&self.scripts).get_mut(&kind) {
            script.current = answer;
        }
        Ok(RequestOutcome::Resolved(answer))
    }

    fn status_changes(&self) -> broadcast::Receiver<StatusChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_only_when_not_determined() {
        let provider = SimulatedProvider::new()
            .with_initial(PermissionKind::Camera, ProviderStatus::Denied);

        let outcome = provider.request_access(PermissionKind::Camera).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Resolved(ProviderStatus::Denied));
        assert_eq!(provider.prompt_count(PermissionKind::Camera), 0);

        let outcome = provider.request_access(PermissionKind::Microphone).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Resolved(ProviderStatus::Authorized));
        assert_eq!(provider.prompt_count(PermissionKind::Microphone), 1);
        assert_eq!(provider.current(PermissionKind::Microphone), ProviderStatus::Authorized);
    }

    #[tokio::test]
    async fn test_deferred_kind_answers_on_channel() {
        let provider = SimulatedProvider::new();
        let mut changes = provider.status_changes();

        let outcome = provider.request_access(PermissionKind::Location).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Pending);

        let change = tokio::time::timeout(Duration::from_secs(2), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.kind, PermissionKind::Location);
        assert_eq!(change.status, ProviderStatus::AuthorizedWhenInUse);
    }

    #[tokio::test]
    async fn test_failing_kind() {
        let provider = SimulatedProvider::new().failing(PermissionKind::PhotoLibrary);
        assert!(provider.query_current_state(PermissionKind::PhotoLibrary).is_err());
        assert!(provider.request_access(PermissionKind::PhotoLibrary).await.is_err());

        provider.set_failing(PermissionKind::PhotoLibrary, false);
        assert!(provider.request_access(PermissionKind::PhotoLibrary).await.is_ok());
    }

    #[tokio::test]
    async fn test_external_change_is_broadcast() {
        let provider = SimulatedProvider::new();
        let mut changes = provider.status_changes();
        provider.set_status_externally(PermissionKind::Camera, ProviderStatus::Restricted);

        let change = changes.recv().await.unwrap();
        assert_eq!(change.status, ProviderStatus::Restricted);
        assert_eq!(
            provider.query_current_state(PermissionKind::Camera).unwrap(),
            ProviderStatus::Restricted
        );
    }
}
