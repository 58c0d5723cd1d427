//! CLI UI Command
//!
//! Runs a simulated session in the terminal sheet. Settings changes given
//! on the command line are applied once the session settles.

use std::sync::Arc;

use anyhow::Result;
use permsheet_config::SheetConfig;
use permsheet_sequencer::{RecordingNavigator, SequencerRuntime};
use tracing::{info, warn};

use crate::output::summarize;
use crate::scenario::ScenarioArgs;

pub async fn run(config: &SheetConfig, args: &ScenarioArgs) -> Result<()> {
    let provider = Arc::new(args.build_provider());
    let navigator = Arc::new(RecordingNavigator::new());
    let handle = SequencerRuntime::spawn(provider.clone(), navigator.clone(), config);

    if !args.settings.is_empty() {
        let handle = handle.clone();
        let provider = provider.clone();
        let settings = args.settings.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.wait_for(|s| s.is_settled()).await {
                warn!(error = %e, "Session ended before settings changes were applied");
                return;
            }
            for (kind, status) in settings {
                provider.set_status_externally(kind, status);
            }
        });
    }

    permsheet_tui::run_sheet(handle.clone()).await?;

    let last = handle.snapshot();
    handle.shutdown().await;
    info!(settings_opened = navigator.open_count(), "Sheet closed");
    summarize(&last);
    Ok(())
}
