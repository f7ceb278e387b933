//! Breadcrumb line derived from the view stack.

use crate::theme::theme;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub struct Crumbs<'a> {
    pub path: &'a [String],
}

impl<'a> Crumbs<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let mut spans = Vec::with_capacity(self.path.len() * 2 + 1);
        spans.push(Span::raw(" "));
        for (i, part) in self.path.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" › ", Style::default().fg(t.text_dim)));
            }
            let style = if i + 1 == self.path.len() {
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(t.text_dim)
            };
            spans.push(Span::styled(part.as_str(), style));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
