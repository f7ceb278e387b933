//! Predefined query-template picker.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::filter::QUERY_TEMPLATES;
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

pub struct TemplatePickerModal {
    id: ScreenId,
    parent: ScreenId,
    selection: usize,
}

impl TemplatePickerModal {
    pub fn new(parent: ScreenId) -> Self {
        Self { id: next_screen_id(), parent, selection: 0 }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "query-templates"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < QUERY_TEMPLATES.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => {
                let template = QUERY_TEMPLATES[self.selection];
                if template.placeholder().is_some() {
                    let modal = InputModal::template_value(self.parent, template);
                    vec![Action::Pop, Action::Push(Box::new(Screen::Input(modal)))]
                } else {
                    vec![
                        Action::Pop,
                        Action::ToScreen(
                            self.parent,
                            ScreenMsg::QueryComposed(template.query.to_string()),
                        ),
                    ]
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
            KeyHint::new("enter", "Use Template"),
            KeyHint::new("esc", "Close"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 70, QUERY_TEMPLATES.len() as u16 + 4);
        f.render_widget(Clear, rect);

        let items: Vec<ListItem> = QUERY_TEMPLATES
            .iter()
            .map(|template| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<22}", template.name),
                        Style::default().fg(t.text),
                    ),
                    Span::styled(template.query, Style::default().fg(t.text_dim)),
                ]))
            })
            .collect();

        let block = Block::default()
            .title(Span::styled(
                " Query Templates ",
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
