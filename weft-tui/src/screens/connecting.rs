//! Minimal screen shown while the startup connection retries run.

use crate::theme::theme;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

pub fn draw_connecting(
    f: &mut Frame<'_>,
    address: &str,
    attempt: u32,
    max_attempts: u32,
    last_error: Option<&str>,
) {
    let t = theme();
    let area = f.size();
    let width = 60.min(area.width);
    let height = 7.min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Connecting to {address}…"),
            Style::default().fg(t.text),
        )),
        Line::from(Span::styled(
            format!("attempt {attempt}/{max_attempts}"),
            Style::default().fg(t.text_dim),
        )),
    ];
    if let Some(error) = last_error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(t.failed),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "[q] Quit",
        Style::default().fg(t.text_dim),
    )));

    let block = Block::default()
        .title(Span::styled(
            " weft ",
            Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(t.border_focus));
    f.render_widget(Paragraph::new(lines).block(block), rect);
}
