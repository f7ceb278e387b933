//! Visibility-expression input with context-aware autocomplete and
//! history browsing. Up/Down walk the submission history while the
//! suggestion list is empty; otherwise they move the suggestion cursor.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::filter::{suggest, SearchHistory};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

pub struct VisibilityInputModal {
    id: ScreenId,
    parent: ScreenId,
    input: String,
    suggestions: Vec<String>,
    suggestion_idx: Option<usize>,
    /// Snapshot of the parent's history; browsing state is local, the
    /// parent appends on submit.
    history: SearchHistory,
}

impl VisibilityInputModal {
    pub fn new(parent: ScreenId, current: &str, history: SearchHistory) -> Self {
        let mut modal = Self {
            id: next_screen_id(),
            parent,
            input: current.to_string(),
            suggestions: Vec::new(),
            suggestion_idx: None,
            history,
        };
        modal.refresh_suggestions();
        modal
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "visibility-query"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        true
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = suggest(&self.input);
        self.suggestion_idx = if self.suggestions.is_empty() { None } else { Some(0) };
    }

    fn accept_suggestion(&mut self) {
        let Some(idx) = self.suggestion_idx else { return };
        let Some(candidate) = self.suggestions.get(idx).cloned() else { return };
        match self.input.rfind(|c: char| c.is_whitespace() || c == '=' || c == '<' || c == '>') {
            Some(pos) => {
                self.input.truncate(pos + 1);
                self.input.push_str(&candidate);
            }
            None => self.input = candidate,
        }
        self.refresh_suggestions();
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => {
                self.history.reset_browse();
                vec![Action::Pop]
            }
            KeyCode::Enter => {
                let query = self.input.trim().to_string();
                vec![
                    Action::Pop,
                    Action::ToScreen(self.parent, ScreenMsg::QueryComposed(query)),
                ]
            }
            KeyCode::Tab => {
                self.accept_suggestion();
                Vec::new()
            }
            KeyCode::Up => {
                if self.suggestions.is_empty() {
                    if let Some(entry) = self.history.previous() {
                        self.input = entry.to_string();
                    }
                } else if let Some(idx) = self.suggestion_idx {
                    self.suggestion_idx = Some(idx.saturating_sub(1));
                }
                Vec::new()
            }
            KeyCode::Down => {
                if self.suggestions.is_empty() {
                    if let Some(entry) = self.history.next() {
                        self.input = entry;
                    }
                } else if let Some(idx) = self.suggestion_idx {
                    self.suggestion_idx = Some((idx + 1).min(self.suggestions.len() - 1));
                }
                Vec::new()
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.refresh_suggestions();
                Vec::new()
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.refresh_suggestions();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, _msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("tab", "Complete"),
            KeyHint::new("↑/↓", "History/Suggest"),
            KeyHint::new("enter", "Apply"),
            KeyHint::new("esc", "Cancel"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 80, 12);
        f.render_widget(Clear, rect);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("› ", Style::default().fg(t.accent)),
                Span::styled(self.input.clone(), Style::default().fg(t.text)),
                Span::styled("▏", Style::default().fg(t.accent)),
            ]),
            Line::default(),
        ];

        if self.suggestions.is_empty() {
            let note = if self.history.is_empty() {
                "no suggestions".to_string()
            } else {
                format!("↑/↓ history ({} saved)", self.history.len())
            };
            lines.push(Line::from(Span::styled(note, Style::default().fg(t.text_dim))));
        } else {
            for (i, candidate) in self.suggestions.iter().take(7).enumerate() {
                let style = if self.suggestion_idx == Some(i) {
                    Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(t.text_dim)
                };
                lines.push(Line::from(Span::styled(format!("  {candidate}"), style)));
            }
        }

        let block = Block::default()
            .title(Span::styled(
                " Visibility Query ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}
