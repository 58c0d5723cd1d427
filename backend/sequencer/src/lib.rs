//! Permission Sequencer
//!
//! Walks the permission catalog in display order, prompting for each
//! undetermined permission, and reconciles request results with
//! out-of-band status changes on a single ordered event loop.

pub mod providers;
pub mod runtime;
pub mod sequencer;
pub mod snapshot;

pub use providers::{RecordingNavigator, SimulatedProvider};
pub use runtime::{SequencerHandle, SequencerRuntime, UserIntent};
pub use sequencer::{Effect, RequestTicket, Sequencer};
pub use snapshot::{row_glyph, SequencerSnapshot};
