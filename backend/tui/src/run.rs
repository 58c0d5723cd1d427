//! Interactive loop: raw-mode terminal, key reader thread, and redraw on
//! every snapshot or key press.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use permsheet_sequencer::{SequencerHandle, UserIntent};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::SheetView;
use crate::input::map_key;
use crate::render::draw_sheet;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Restores the terminal even when the loop bails with an error.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut Stdout) -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Drive the sheet until the user quits or the session ends.
pub async fn run_sheet(handle: SequencerHandle) -> Result<()> {
    let mut stdout = io::stdout();
    let _guard = TerminalGuard::enter(&mut stdout)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut snapshots = handle.subscribe();
    let mut view = SheetView::from_snapshot(&snapshots.borrow_and_update());
    let mut keys = spawn_key_reader();

    loop {
        terminal.draw(|f| draw_sheet(f, &view))?;

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                if let Some(intent) = map_key(key, &mut view) {
                    dispatch(&handle, intent, &mut view).await;
                }
                if view.should_quit {
                    break;
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("Session ended, leaving sheet");
                    break;
                }
                view.update(&snapshots.borrow_and_update());
            }
        }
    }

    Ok(())
}

async fn dispatch(handle: &SequencerHandle, intent: UserIntent, view: &mut SheetView) {
    match handle.send_intent(intent).await {
        Ok(true) => view.status_line = None,
        Ok(false) => view.set_status(match intent {
            UserIntent::Retry(_) => "Nothing to request for this row",
            UserIntent::Dismiss => "Grant every permission to continue",
            UserIntent::OpenSettings => "No denied permission to fix in settings",
        }),
        Err(e) => {
            warn!(error = %e, intent = %intent, "Intent not delivered");
            view.set_status(e.to_string());
        }
    }
}

/// Reads key presses on a blocking thread. Stops once the receiver is gone.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Failed to read terminal event");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to poll terminal events");
                    break;
                }
            }
        }
    });
    rx
}
