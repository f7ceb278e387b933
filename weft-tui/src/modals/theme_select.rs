//! Theme selector modal.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::screen::{Action, KeyHint};
use crate::theme::{set_theme, theme, theme_names};
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

pub struct ThemeSelectModal {
    id: ScreenId,
    selection: usize,
}

impl ThemeSelectModal {
    pub fn new() -> Self {
        let current = theme().name;
        let selection = theme_names().iter().position(|&n| n == current).unwrap_or(0);
        Self { id: next_screen_id(), selection }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "theme-selector"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        let names = theme_names();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < names.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => {
                let name = names[self.selection];
                match set_theme(name) {
                    Ok(()) => vec![Action::PersistTheme(name.to_string()), Action::Pop],
                    // Unknown names cannot come from the built-in list;
                    // leave the previous theme intact regardless.
                    Err(_) => vec![Action::Pop],
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
            KeyHint::new("enter", "Select"),
            KeyHint::new("esc", "Close"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let names = theme_names();
        let rect = centered_rect(area, 40, names.len() as u16 + 4);
        f.render_widget(Clear, rect);

        let items: Vec<ListItem> = names
            .iter()
            .map(|&name| {
                let marker = if name == t.name { "✓ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(t.completed)),
                    Span::styled(name, Style::default().fg(t.text)),
                ]))
            })
            .collect();

        let block = Block::default()
            .title(Span::styled(
                " Select Theme ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = ListState::default();
        state.select(Some(self.selection));
        f.render_stateful_widget(list, rect, &mut state);
    }
}

impl Default for ThemeSelectModal {
    fn default() -> Self {
        Self::new()
    }
}
