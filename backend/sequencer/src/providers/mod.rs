pub mod settings;
pub mod simulated;

pub use settings::RecordingNavigator;
pub use simulated::SimulatedProvider;
