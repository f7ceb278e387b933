//! Result display for workflow queries.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub struct QueryResultModal {
    id: ScreenId,
    query_type: String,
    body: String,
    is_error: bool,
}

impl QueryResultModal {
    pub fn result(query_type: &str, body: &str) -> Self {
        Self {
            id: next_screen_id(),
            query_type: query_type.to_string(),
            body: body.to_string(),
            is_error: false,
        }
    }

    pub fn error(query_type: &str, message: &str) -> Self {
        Self {
            id: next_screen_id(),
            query_type: query_type.to_string(),
            body: message.to_string(),
            is_error: true,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "query-result"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => vec![Action::Pop],
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, _msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![KeyHint::new("enter", "Close")]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 72, 16);
        f.render_widget(Clear, rect);

        let (label, color) = if self.is_error {
            ("Query failed", t.failed)
        } else {
            ("Result", t.completed)
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{label}: "), Style::default().fg(color)),
                Span::styled(self.query_type.clone(), Style::default().fg(t.text)),
            ]),
            Line::default(),
        ];
        for line in self.body.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(if self.is_error { t.failed } else { t.text }),
            )));
        }

        let block = Block::default()
            .title(Span::styled(
                " Query ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            rect,
        );
    }
}
