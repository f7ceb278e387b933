//! Help overlay.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("q", "quit (at root)"),
            ("Esc / Backspace", "back"),
            ("?", "help"),
            ("T", "theme selector"),
            ("j/k / arrows", "navigate"),
            ("r", "refresh"),
            ("a", "auto-refresh"),
        ],
    ),
    (
        "Lists",
        &[
            ("Enter", "drill down"),
            ("p", "toggle preview"),
            ("y", "copy id"),
            ("/", "substring filter"),
            ("F", "visibility query"),
            ("f", "query templates"),
            ("D", "date range"),
            ("L / S / C", "load / save / clear filter"),
            ("v", "multi-select mode"),
        ],
    ),
    (
        "Workflow detail",
        &[
            ("e", "event history"),
            ("c / X", "cancel / terminate"),
            ("s / Q", "signal / query"),
            ("R", "reset"),
            ("D", "delete"),
        ],
    ),
    (
        "Event history",
        &[
            ("v or 1/2/3", "list / tree / timeline"),
            ("e / c", "expand / collapse all"),
            ("f", "jump to failed"),
            ("+/- h/l", "zoom / scroll timeline"),
        ],
    ),
];

pub struct HelpModal {
    id: ScreenId,
}

impl HelpModal {
    pub fn new() -> Self {
        Self { id: next_screen_id() }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "help"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
                vec![Action::Pop]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, _msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![KeyHint::new("esc", "Close")]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 64, 28);
        f.render_widget(Clear, rect);

        let mut lines = Vec::new();
        for (section, bindings) in SECTIONS {
            lines.push(Line::from(Span::styled(
                *section,
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            )));
            for (key, description) in *bindings {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {key:<16}"), Style::default().fg(t.text)),
                    Span::styled(*description, Style::default().fg(t.text_dim)),
                ]));
            }
            lines.push(Line::default());
        }

        let block = Block::default()
            .title(Span::styled(
                " Keybindings ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

impl Default for HelpModal {
    fn default() -> Self {
        Self::new()
    }
}
