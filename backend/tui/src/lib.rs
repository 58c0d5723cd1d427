//! TUI for the permission sheet.
//!
//! Renders sequencer snapshots with ratatui and turns key presses into
//! user intents. Backs "permsheet ui".

pub mod app;
pub mod input;
pub mod render;
pub mod run;

pub use app::SheetView;
pub use input::map_key;
pub use render::draw_sheet;
pub use run::run_sheet;
