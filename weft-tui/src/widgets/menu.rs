//! Bottom menu bar rendering the focused screen's key hints.

use crate::screen::KeyHint;
use crate::theme::theme;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub struct MenuBar<'a> {
    pub hints: &'a [KeyHint],
}

impl<'a> MenuBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let mut spans = Vec::with_capacity(self.hints.len() * 3);
        for hint in self.hints {
            spans.push(Span::styled(format!("<{}>", hint.key), Style::default().fg(t.accent)));
            spans.push(Span::styled(
                format!(" {}  ", hint.description),
                Style::default().fg(t.text_dim),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
