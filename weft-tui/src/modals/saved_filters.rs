//! Saved-filter picker: load, delete, set-default, save-current.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::modals::input::InputModal;
use crate::screen::{Action, KeyHint, Screen};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;
use weft_core::SavedFilter;

pub struct FilterPickerModal {
    id: ScreenId,
    parent: ScreenId,
    filters: Vec<SavedFilter>,
    current_query: String,
    selection: usize,
}

impl FilterPickerModal {
    pub fn new(parent: ScreenId, filters: Vec<SavedFilter>, current_query: &str) -> Self {
        Self {
            id: next_screen_id(),
            parent,
            filters,
            current_query: current_query.to_string(),
            selection: 0,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "saved-filters"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.filters.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => match self.filters.get(self.selection) {
                Some(filter) => vec![
                    Action::Pop,
                    Action::ToScreen(self.parent, ScreenMsg::QueryComposed(filter.query.clone())),
                ],
                None => Vec::new(),
            },
            KeyCode::Char('d') => match self.filters.get(self.selection) {
                Some(filter) => {
                    let name = filter.name.clone();
                    self.filters.retain(|f| f.name != name);
                    self.selection = self.selection.min(self.filters.len().saturating_sub(1));
                    vec![Action::DeleteFilter(name)]
                }
                None => Vec::new(),
            },
            KeyCode::Char('*') => match self.filters.get(self.selection) {
                Some(filter) => {
                    let name = filter.name.clone();
                    for f in &mut self.filters {
                        f.is_default = f.name == name;
                    }
                    vec![Action::SetDefaultFilter(name)]
                }
                None => Vec::new(),
            },
            KeyCode::Char('s') => {
                if self.current_query.is_empty() {
                    Vec::new()
                } else {
                    let modal = InputModal::save_filter(self.parent, &self.current_query);
                    vec![Action::Pop, Action::Push(Box::new(Screen::Input(modal)))]
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
            KeyHint::new("enter", "Load"),
            KeyHint::new("d", "Delete"),
            KeyHint::new("*", "Set Default"),
            KeyHint::new("s", "Save Current"),
            KeyHint::new("esc", "Close"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let height = (self.filters.len() as u16).max(1).min(12) + 4;
        let rect = centered_rect(area, 70, height);
        f.render_widget(Clear, rect);

        let items: Vec<ListItem> = if self.filters.is_empty() {
            vec![ListItem::new(Span::styled(
                "no saved filters",
                Style::default().fg(t.text_dim),
            ))]
        } else {
            self.filters
                .iter()
                .map(|filter| {
                    let marker = if filter.is_default { "★ " } else { "  " };
                    ListItem::new(Line::from(vec![
                        Span::styled(marker, Style::default().fg(t.warning)),
                        Span::styled(
                            format!("{:<20}", filter.name),
                            Style::default().fg(t.text),
                        ),
                        Span::styled(filter.query.clone(), Style::default().fg(t.text_dim)),
                    ]))
                })
                .collect()
        };

        let block = Block::default()
            .title(Span::styled(
                " Saved Filters ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = ListState::default();
        state.select(Some(self.selection.min(self.filters.len().saturating_sub(1))));
        f.render_stateful_widget(list, rect, &mut state);
    }
}
