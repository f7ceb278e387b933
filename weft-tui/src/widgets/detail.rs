//! Detail panel: key/value rows with aligned keys.

use crate::theme::theme;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(String, String)>,
}

impl<'a> DetailPanel<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let width = self
            .fields
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0);

        let lines: Vec<Line> = self
            .fields
            .iter()
            .map(|(key, value)| {
                if key.is_empty() {
                    return Line::from(Span::styled(value.clone(), Style::default().fg(t.text)));
                }
                let padded = format!("{key:width$}");
                Line::from(vec![
                    Span::styled(
                        padded,
                        Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(value.clone(), Style::default().fg(t.text)),
                ])
            })
            .collect();

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(t.border)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(widget, area);
    }
}

/// Splits a comma-separated `Key: value` details string into pairs.
/// Fragments without a key come back with an empty key.
pub fn parse_details(details: &str) -> Vec<(String, String)> {
    details
        .split(", ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.find(": ") {
            Some(idx) => (part[..idx].to_string(), part[idx + 2..].to_string()),
            None => (String::new(), part.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_split_into_pairs() {
        let pairs = parse_details("ActivityType: ProcessPayment, Attempt: 2, standalone");
        assert_eq!(
            pairs,
            vec![
                ("ActivityType".to_string(), "ProcessPayment".to_string()),
                ("Attempt".to_string(), "2".to_string()),
                (String::new(), "standalone".to_string()),
            ]
        );
    }

    #[test]
    fn empty_details_yield_no_pairs() {
        assert!(parse_details("").is_empty());
    }
}
