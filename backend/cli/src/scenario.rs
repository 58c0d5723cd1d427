//! Scripted simulator sessions shared by `simulate` and `ui`.

use std::time::Duration;

use clap::Args;
use permsheet_core::{PermissionKind, ProviderStatus};
use permsheet_sequencer::SimulatedProvider;

#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// Status recorded before the session starts (repeatable), e.g. camera=denied
    #[arg(long = "initial", value_name = "KIND=STATUS", value_parser = parse_assignment)]
    pub initial: Vec<(PermissionKind, ProviderStatus)>,

    /// What the simulated user answers when prompted (repeatable)
    #[arg(long = "answer", value_name = "KIND=STATUS", value_parser = parse_assignment)]
    pub answer: Vec<(PermissionKind, ProviderStatus)>,

    /// Never answer the Location prompt
    #[arg(long)]
    pub hold_location: bool,

    /// Settings-app changes applied once the session settles (repeatable)
    #[arg(long = "settings", value_name = "KIND=STATUS", value_parser = parse_assignment)]
    pub settings: Vec<(PermissionKind, ProviderStatus)>,

    /// Milliseconds the simulated user takes to answer each prompt
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
}

impl ScenarioArgs {
    pub fn build_provider(&self) -> SimulatedProvider {
        let mut provider = SimulatedProvider::new().with_delay(Duration::from_millis(self.delay_ms));
        for (kind, status) in &self.initial {
            provider = provider.with_initial(*kind, *status);
        }
        for (kind, status) in &self.answer {
            provider = provider.with_answer(*kind, *status);
        }
        if self.hold_location {
            provider = provider.holding(PermissionKind::Location);
        }
        provider
    }
}

/// Parse `kind=status`, e.g. `photos=limited`.
pub fn parse_assignment(raw: &str) -> Result<(PermissionKind, ProviderStatus), String> {
    let (kind, status) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=STATUS, got \"{raw}\""))?;
    let kind = kind.parse::<PermissionKind>().map_err(|e| e.to_string())?;
    let status = status.parse::<ProviderStatus>().map_err(|e| e.to_string())?;
    Ok((kind, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use permsheet_core::CapabilityProvider;

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_assignment("photos=limited").unwrap(),
            (PermissionKind::PhotoLibrary, ProviderStatus::Limited)
        );
        assert_eq!(
            parse_assignment("location=when_in_use").unwrap(),
            (PermissionKind::Location, ProviderStatus::AuthorizedWhenInUse)
        );
        assert!(parse_assignment("camera").is_err());
        assert!(parse_assignment("bluetooth=denied").is_err());
        assert!(parse_assignment("camera=maybe").is_err());
    }

    #[tokio::test]
    async fn builds_provider_from_args() {
        let args = ScenarioArgs {
            initial: vec![(PermissionKind::Camera, ProviderStatus::Denied)],
            answer: vec![(PermissionKind::Microphone, ProviderStatus::Restricted)],
            ..Default::default()
        };
        let provider = args.build_provider();
        assert_eq!(
            provider.query_current_state(PermissionKind::Camera).unwrap(),
            ProviderStatus::Denied
        );
        provider.request_access(PermissionKind::Microphone).await.unwrap();
        assert_eq!(provider.current(PermissionKind::Microphone), ProviderStatus::Restricted);
    }
}
