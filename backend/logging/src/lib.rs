//! Structured logging for the permission sheet.
//!
//! Handles subscriber setup (console + optional rolling NDJSON file) and the
//! per-transition event log emitted by the sequencer.

pub mod logger;
pub mod transition_logger;

pub use logger::init_logger;
pub use transition_logger::{SheetEvent, TransitionLogEntry, TransitionLogger, TRANSITION_TARGET};
