use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Book;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Footer line of `[key] Action` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, action)) in hints.iter().enumerate() {
        let gap = if idx + 1 == hints.len() { "" } else { "   " };
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::raw(format!(" {action}{gap}")));
    }
    Line::from(spans)
}

/// Two-line list entry: "Title (Year)" over author and loan status.
pub(crate) fn book_lines(book: &Book, selected: bool) -> Vec<Line<'static>> {
    let title = if selected {
        format!("▶ {}", book.display_title())
    } else {
        format!("  {}", book.display_title())
    };
    let status_style = if book.is_loaned {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                format!("  {}", book.display_author()),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  ·  "),
            Span::styled(book.loan_status(), status_style),
        ]),
    ]
}
