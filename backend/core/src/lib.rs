pub mod catalog;
pub mod error;
pub mod state;
pub mod traits;

pub use catalog::{all_kinds, PermissionKind, CATALOG_SIZE};
pub use error::PermissionError;
pub use state::{AuthorizationState, PermissionEntry, ProviderStatus, RequestOutcome, StatusChange};
pub use traits::{CapabilityProvider, SettingsNavigator};
