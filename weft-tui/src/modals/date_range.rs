//! Date-range picker: five presets plus a custom duration input.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::filter::{custom_date_clause, DateRangePreset, DATE_RANGE_PRESETS};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

pub struct DateRangeModal {
    id: ScreenId,
    parent: ScreenId,
    /// 0..DATE_RANGE_PRESETS.len() selects a preset, one past the end is
    /// the custom row.
    selection: usize,
    custom_input: String,
    editing: bool,
    error: Option<String>,
}

impl DateRangeModal {
    pub fn new(parent: ScreenId) -> Self {
        Self {
            id: next_screen_id(),
            parent,
            selection: 0,
            custom_input: String::new(),
            editing: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "date-range"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        self.editing
    }

    fn rows(&self) -> usize {
        DATE_RANGE_PRESETS.len() + 1
    }

    fn submit(&mut self) -> Vec<Action> {
        if self.selection < DATE_RANGE_PRESETS.len() {
            let preset = DATE_RANGE_PRESETS[self.selection];
            return vec![
                Action::Pop,
                Action::ToScreen(self.parent, ScreenMsg::DateRangePicked(preset.clause())),
            ];
        }
        match custom_date_clause(&self.custom_input) {
            Some(clause) => vec![
                Action::Pop,
                Action::ToScreen(self.parent, ScreenMsg::DateRangePicked(Some(clause))),
            ],
            None => {
                self.error = Some("expected a duration like 45m, 3h, 7d or 2w".to_string());
                Vec::new()
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        if self.editing {
            match key.code {
                KeyCode::Enter => {
                    self.editing = false;
                    return self.submit();
                }
                KeyCode::Esc => self.editing = false,
                KeyCode::Backspace => {
                    self.custom_input.pop();
                }
                KeyCode::Char(c) => self.custom_input.push(c),
                _ => {}
            }
            return Vec::new();
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.rows() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => {
                if self.selection == DATE_RANGE_PRESETS.len() {
                    self.editing = true;
                    self.error = None;
                    Vec::new()
                } else {
                    self.submit()
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => vec![Action::Pop],
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, _msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("enter", "Apply"),
            KeyHint::new("esc", "Close"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 52, self.rows() as u16 + 6);
        f.render_widget(Clear, rect);

        let mut lines = Vec::with_capacity(self.rows() + 3);
        for (i, preset) in DATE_RANGE_PRESETS.iter().enumerate() {
            let style = if i == self.selection {
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(t.text)
            };
            let marker = if i == self.selection { "› " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", preset.label()),
                style,
            )));
        }

        let custom_selected = self.selection == DATE_RANGE_PRESETS.len();
        let marker = if custom_selected { "› " } else { "  " };
        let style = if custom_selected {
            Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.text)
        };
        let input = if self.custom_input.is_empty() && !self.editing {
            "Nm | Nh | Nd | Nw".to_string()
        } else {
            self.custom_input.clone()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}Custom: "), style),
            Span::styled(
                input,
                if self.custom_input.is_empty() && !self.editing {
                    Style::default().fg(t.text_dim)
                } else {
                    Style::default().fg(t.text)
                },
            ),
            Span::styled(
                if self.editing { "▏" } else { "" },
                Style::default().fg(t.accent),
            ),
        ]));

        lines.push(Line::default());
        match &self.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(t.failed),
            ))),
            None => lines.push(Line::from(Span::styled(
                "AND-combined with the current query",
                Style::default().fg(t.text_dim),
            ))),
        }

        let block = Block::default()
            .title(Span::styled(
                " Date Range ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}
