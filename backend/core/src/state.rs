use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::PermissionKind;
use crate::error::PermissionError;

/// Tri-state authorization tracked for every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    /// No decision recorded yet.
    #[default]
    Undetermined,
    /// Full or limited access.
    Granted,
    /// Explicitly refused or restricted by policy.
    Denied,
}

impl AuthorizationState {
    pub fn is_resolved(self) -> bool {
        self != AuthorizationState::Undetermined
    }
}

/// Raw authorization status as reported by the OS capability provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    /// Reduced-scope grant (e.g. a subset of the photo library).
    Limited,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl From<ProviderStatus> for AuthorizationState {
    fn from(status: ProviderStatus) -> Self {
        match status {
            ProviderStatus::NotDetermined => AuthorizationState::Undetermined,
            ProviderStatus::Restricted | ProviderStatus::Denied => AuthorizationState::Denied,
            ProviderStatus::Authorized
            | ProviderStatus::Limited
            | ProviderStatus::AuthorizedAlways
            | ProviderStatus::AuthorizedWhenInUse => AuthorizationState::Granted,
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

impl FromStr for ProviderStatus {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_determined" | "undetermined" => Ok(ProviderStatus::NotDetermined),
            "restricted" => Ok(ProviderStatus::Restricted),
            "denied" => Ok(ProviderStatus::Denied),
            "authorized" | "granted" => Ok(ProviderStatus::Authorized),
            "limited" => Ok(ProviderStatus::Limited),
            "authorized_always" | "always" => Ok(ProviderStatus::AuthorizedAlways),
            "authorized_when_in_use" | "when_in_use" => Ok(ProviderStatus::AuthorizedWhenInUse),
            _ => Err(PermissionError::UnknownStatus(s.to_owned())),
        }
    }
}

/// One row of the sheet: a permission kind and its current authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub kind: PermissionKind,
    pub state: AuthorizationState,
}

impl PermissionEntry {
    pub fn new(kind: PermissionKind, state: AuthorizationState) -> Self {
        Self { kind, state }
    }
}

/// What a provider's `request_access` call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The OS answered the prompt before the call returned.
    Resolved(ProviderStatus),
    /// The prompt was initiated; the decision arrives on the status-change channel.
    Pending,
}

/// An out-of-band authorization change delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub kind: PermissionKind,
    pub status: ProviderStatus,
}
