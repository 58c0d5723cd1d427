//! Keyboard Input Handler
//!
//! Maps crossterm key events onto selection changes and sequencer intents.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use permsheet_sequencer::UserIntent;

use crate::app::SheetView;

/// Handles a single key press. Returns the intent to dispatch, if any.
pub fn map_key(key: KeyEvent, view: &mut SheetView) -> Option<UserIntent> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.should_quit = true;
            None
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            view.should_quit = true;
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view.select_previous();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view.select_next();
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserIntent::Retry(view.selected)),
        KeyCode::Char('d') => Some(UserIntent::Dismiss),
        KeyCode::Char('s') => Some(UserIntent::OpenSettings),
        _ => None,
    }
}
