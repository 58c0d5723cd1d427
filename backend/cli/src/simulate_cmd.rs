//! CLI Simulate Command
//!
//! Drives a headless session against the simulated provider and prints
//! every published snapshot as one JSON line on stdout.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use permsheet_config::SheetConfig;
use permsheet_sequencer::{
    RecordingNavigator, SequencerHandle, SequencerRuntime, SequencerSnapshot, SimulatedProvider,
};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::output::{summarize, write_snapshot};
use crate::scenario::ScenarioArgs;

/// Quiet period after which a session that cannot settle is reported as is.
const IDLE_GRACE: Duration = Duration::from_millis(250);

pub async fn run(config: &SheetConfig, args: &ScenarioArgs) -> Result<()> {
    let provider = Arc::new(args.build_provider());
    let navigator = Arc::new(RecordingNavigator::new());
    let handle = SequencerRuntime::spawn(provider.clone(), navigator, config);
    info!(session_id = %handle.session_id(), "Simulation started");

    let idle = Duration::from_millis(args.delay_ms) + IDLE_GRACE;
    let last = drive(&provider, &handle, args, &mut io::stdout(), idle).await?;

    handle.shutdown().await;
    summarize(&last);
    Ok(())
}

/// Print the session until it settles, then replay each settings change.
async fn drive(
    provider: &SimulatedProvider,
    handle: &SequencerHandle,
    args: &ScenarioArgs,
    out: &mut impl Write,
    idle: Duration,
) -> Result<SequencerSnapshot> {
    let mut snapshots = handle.subscribe();
    let mut printed = None;
    let mut last = print_until_quiet(&mut snapshots, out, &mut printed, idle).await?;

    for (kind, status) in &args.settings {
        info!(kind = %kind, status = %status, "Applying settings change");
        provider.set_status_externally(*kind, *status);
        // The previous snapshot may already look settled.
        let _ = tokio::time::timeout(idle, snapshots.changed()).await;
        last = print_until_quiet(&mut snapshots, out, &mut printed, idle).await?;
    }
    Ok(last)
}

/// Print snapshots until the session settles or goes quiet for `idle`.
async fn print_until_quiet(
    snapshots: &mut watch::Receiver<SequencerSnapshot>,
    out: &mut impl Write,
    printed: &mut Option<u64>,
    idle: Duration,
) -> Result<SequencerSnapshot> {
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if *printed != Some(snapshot.revision) {
            write_snapshot(out, &snapshot)?;
            *printed = Some(snapshot.revision);
        }
        if snapshot.is_settled() && snapshot.pending.is_empty() {
            return Ok(snapshot);
        }
        match tokio::time::timeout(idle, snapshots.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                debug!("Session closed while printing");
                return Ok(snapshot);
            }
            Err(_) => {
                debug!(revision = snapshot.revision, "Session idle");
                return Ok(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permsheet_core::{PermissionKind, ProviderStatus};

    async fn simulate(args: ScenarioArgs) -> (Vec<SequencerSnapshot>, SequencerSnapshot) {
        let provider = Arc::new(args.build_provider());
        let handle = SequencerRuntime::spawn(
            provider.clone(),
            Arc::new(RecordingNavigator::new()),
            &SheetConfig::default(),
        );
        let mut buf = Vec::new();
        let last = drive(&provider, &handle, &args, &mut buf, IDLE_GRACE)
            .await
            .unwrap();
        handle.shutdown().await;
        let lines = String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (lines, last)
    }

    #[tokio::test]
    async fn default_session_grants_everything() {
        let (lines, last) = simulate(ScenarioArgs::default()).await;
        assert!(last.all_granted);
        assert!(last.modal_visible);
        let revisions: Vec<_> = lines.iter().map(|s| s.revision).collect();
        let mut sorted = revisions.clone();
        sorted.dedup();
        assert_eq!(revisions, sorted);
    }

    #[tokio::test]
    async fn held_location_stops_when_quiet() {
        let args = ScenarioArgs {
            hold_location: true,
            ..Default::default()
        };
        let (_, last) = simulate(args).await;
        assert!(!last.is_settled());
        assert!(last.is_pending(PermissionKind::Location));
    }

    #[tokio::test]
    async fn settings_changes_are_applied_after_settling() {
        let args = ScenarioArgs {
            answer: vec![(PermissionKind::Camera, ProviderStatus::Denied)],
            settings: vec![(PermissionKind::Camera, ProviderStatus::Authorized)],
            ..Default::default()
        };
        let (lines, last) = simulate(args).await;
        assert!(lines.iter().any(|s| s.any_denied));
        assert!(last.all_granted);
    }
}
