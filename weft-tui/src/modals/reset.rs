//! Reset flow modals: the quick two-button reset offered when a failure
//! point is detected, and the full reset-point picker.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::modals::confirm::{ConfirmAction, ConfirmModal};
use crate::screen::{Action, KeyHint, Screen};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use weft_core::ResetPoint;

/// Identifiers of the run being reset, carried by value.
#[derive(Debug, Clone)]
pub struct ResetTarget {
    pub namespace: String,
    pub workflow_id: String,
    pub run_id: String,
}

fn reset_confirm(parent: ScreenId, target: &ResetTarget, event_id: i64) -> ConfirmModal {
    let command = format!(
        "weft workflow reset \\\n  --workflow-id {} \\\n  --run-id {} \\\n  --namespace {} \\\n  --event-id {event_id} \\\n  --reason \"Reset via weft\"",
        target.workflow_id, target.run_id, target.namespace
    );
    ConfirmModal::new(
        parent,
        "Reset Workflow",
        format!("Reset workflow {} to event {event_id}?", target.workflow_id),
        command,
        ConfirmAction::ResetWorkflow {
            namespace: target.namespace.clone(),
            workflow_id: target.workflow_id.clone(),
            run_id: target.run_id.clone(),
            event_id,
            reason: "Reset via weft".to_string(),
        },
    )
    .with_warning("This creates a new run from the chosen event. The current run is unchanged.")
}

/// Two-button quick reset to the first detected failure point.
pub struct QuickResetModal {
    id: ScreenId,
    parent: ScreenId,
    target: ResetTarget,
    failure_point: ResetPoint,
    all_points: Vec<ResetPoint>,
}

impl QuickResetModal {
    pub fn new(
        parent: ScreenId,
        target: ResetTarget,
        failure_point: ResetPoint,
        all_points: Vec<ResetPoint>,
    ) -> Self {
        Self {
            id: next_screen_id(),
            parent,
            target,
            failure_point,
            all_points,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "quick-reset"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Enter => {
                let confirm = reset_confirm(self.parent, &self.target, self.failure_point.event_id);
                vec![Action::Pop, Action::Push(Box::new(Screen::Confirm(confirm)))]
            }
            KeyCode::Char('a') => {
                let picker = ResetPickerModal::new(
                    self.parent,
                    self.target.clone(),
                    self.all_points.clone(),
                );
                vec![Action::Pop, Action::Push(Box::new(Screen::ResetPicker(picker)))]
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
            KeyHint::new("enter", "Reset to Failure"),
            KeyHint::new("a", "All Reset Points"),
            KeyHint::new("esc", "Cancel"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let rect = centered_rect(area, 64, 10);
        f.render_widget(Clear, rect);

        let lines = vec![
            Line::from(Span::styled(
                format!("Failure detected at event {}:", self.failure_point.event_id),
                Style::default().fg(t.text),
            )),
            Line::from(Span::styled(
                format!("  {} — {}", self.failure_point.event_type, self.failure_point.description),
                Style::default().fg(t.failed),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Reset this run to just before the failure?",
                Style::default().fg(t.text),
            )),
            Line::default(),
            Line::from(Span::styled(
                "[Enter] Reset to failure  [a] Choose another point  [Esc] Cancel",
                Style::default().fg(t.text_dim),
            )),
        ];

        let block = Block::default()
            .title(Span::styled(
                " Quick Reset ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

/// Full picker over all reset points; failure rows are highlighted.
pub struct ResetPickerModal {
    id: ScreenId,
    parent: ScreenId,
    target: ResetTarget,
    points: Vec<ResetPoint>,
    selection: usize,
}

impl ResetPickerModal {
    pub fn new(parent: ScreenId, target: ResetTarget, points: Vec<ResetPoint>) -> Self {
        Self {
            id: next_screen_id(),
            parent,
            target,
            points,
            selection: 0,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "reset-picker"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {}

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn on_key(&mut self, key: KeyEvent, _ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.points.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => match self.points.get(self.selection) {
                Some(point) => {
                    let confirm = reset_confirm(self.parent, &self.target, point.event_id);
                    vec![Action::Pop, Action::Push(Box::new(Screen::Confirm(confirm)))]
                }
                None => Vec::new(),
            },
            KeyCode::Esc | KeyCode::Char('q') => vec![Action::Pop],
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, _msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("j/k", "Navigate"),
            KeyHint::new("enter", "Reset Here"),
            KeyHint::new("esc", "Cancel"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let height = (self.points.len() as u16).min(14) + 4;
        let rect = centered_rect(area, 80, height);
        f.render_widget(Clear, rect);

        let items: Vec<ListItem> = self
            .points
            .iter()
            .map(|point| {
                let color = if point.is_failure_point() { t.failed } else { t.text };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:>5}  ", point.event_id),
                        Style::default().fg(t.text_dim),
                    ),
                    Span::styled(format!("{:<32}", point.event_type), Style::default().fg(color)),
                    Span::styled(
                        point.description.clone(),
                        Style::default().fg(t.text_dim),
                    ),
                ]))
            })
            .collect();

        let block = Block::default()
            .title(Span::styled(
                " Reset Points ",
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
