//! TUI Rendering
//!
//! Translates `SheetView` into Ratatui widgets and draws to the terminal frame.

use permsheet_core::AuthorizationState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{DISMISS_LABEL, RowView, SETTINGS_LABEL, SHEET_TITLE, SheetView};

/// Main draw function.
pub fn draw_sheet(f: &mut Frame, view: &SheetView) {
    if !view.snapshot.modal_visible {
        draw_dismissed(f, view);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Rows
            Constraint::Length(3), // Buttons
            Constraint::Length(1), // Status / key hints
        ])
        .split(f.size());

    let badge = view.snapshot.header_badge();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(SHEET_TITLE, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(badge, Style::default().fg(badge_color(view))),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = view.rows().iter().map(row_item).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default().with_selected(Some(view.selected));
    f.render_stateful_widget(list, chunks[1], &mut list_state);

    draw_buttons(f, view, chunks[2]);

    let footer = view
        .status_line
        .clone()
        .unwrap_or_else(|| "↑/↓ select  enter request  d dismiss  s settings  q quit".into());
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn draw_buttons(f: &mut Frame, view: &SheetView, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let dismiss_style = if view.snapshot.can_dismiss {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Paragraph::new(DISMISS_LABEL)
            .alignment(Alignment::Center)
            .style(dismiss_style)
            .block(Block::default().borders(Borders::ALL)),
        halves[0],
    );

    // Only offered while something is denied.
    if view.snapshot.any_denied {
        f.render_widget(
            Paragraph::new(SETTINGS_LABEL)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL)),
            halves[1],
        );
    }
}

fn draw_dismissed(f: &mut Frame, view: &SheetView) {
    let granted = view.snapshot.granted_labels().join(", ");
    let body = Paragraph::new(vec![
        Line::from("Permissions granted:"),
        Line::from(granted),
        Line::from(""),
        Line::from(Span::styled("q quit", Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(body, f.size());
}

fn row_item(row: &RowView) -> ListItem<'static> {
    let (mark, color) = match row.state {
        AuthorizationState::Granted => ("✓", Color::Green),
        AuthorizationState::Denied => ("✗", Color::Red),
        AuthorizationState::Undetermined => ("?", Color::Yellow),
    };
    let mut spans = vec![
        Span::styled(format!(" {mark} "), Style::default().fg(color)),
        Span::raw(row.label),
        Span::styled(format!("  {}", row.icon), Style::default().fg(Color::DarkGray)),
    ];
    if row.pending {
        spans.push(Span::styled("  waiting…", Style::default().fg(Color::Cyan)));
    }
    if row.focused {
        spans.push(Span::raw("  ◀"));
    }
    ListItem::new(Line::from(spans))
}

fn badge_color(view: &SheetView) -> Color {
    if view.snapshot.all_granted {
        Color::Green
    } else {
        Color::Yellow
    }
}
