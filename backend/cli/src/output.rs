//! Terminal output utilities: colored notes, table rendering, snapshot lines.

use std::io::Write;

use anyhow::Result;
use permsheet_core::{all_kinds, AuthorizationState};
use permsheet_sequencer::SequencerSnapshot;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Print a formatted WARNING note to stderr.
pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

/// Print a formatted SUCCESS note to stderr.
pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

/// Render a left-aligned table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(strip_ansi(cell).chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(strip_ansi(cell).chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.iter().map(|h| h.to_string()).collect());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&line(row.clone()));
    }
    out
}

/// The catalog as a table in display order.
pub fn catalog_table() -> String {
    let rows: Vec<Vec<String>> = all_kinds()
        .into_iter()
        .map(|kind| {
            vec![
                kind.display_order().to_string(),
                kind.as_str().to_string(),
                kind.label().to_string(),
                kind.icon_token().to_string(),
            ]
        })
        .collect();
    render_table(&["#", "KIND", "LABEL", "ICON"], &rows)
}

/// Write one snapshot as a JSON line and flush.
pub fn write_snapshot(writer: &mut impl Write, snapshot: &SequencerSnapshot) -> Result<()> {
    serde_json::to_writer(&mut *writer, snapshot)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// One-line outcome of a session.
pub fn summarize(snapshot: &SequencerSnapshot) {
    if snapshot.all_granted {
        note_success(&format!("Granted: {}", snapshot.granted_labels().join(", ")));
        return;
    }
    let describe = |state: AuthorizationState| {
        snapshot
            .entries
            .iter()
            .filter(|e| e.state == state)
            .map(|e| e.kind.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    if snapshot.any_denied {
        note_warn(&format!(
            "Denied: {} (use the settings redirect to change)",
            describe(AuthorizationState::Denied)
        ));
    }
    let undetermined = describe(AuthorizationState::Undetermined);
    if !undetermined.is_empty() {
        note_warn(&format!("Still undetermined: {undetermined}"));
    }
}
