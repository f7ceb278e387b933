//! Side-by-side comparison of two workflow executions.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, HISTORY_DEADLINE};
use crate::modals::input::InputModal;
use crate::screen::{Action, KeyHint, Screen};
use crate::theme::{status_color, status_icon, theme};
use crate::widgets::two_column;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{format_duration, truncate, HistoryEvent, Workflow, WorkflowStatus};

#[derive(Default)]
struct DiffSide {
    workflow: Option<Workflow>,
    events: Vec<HistoryEvent>,
    selection: usize,
    error: Option<String>,
}

pub struct WorkflowDiff {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    seed: Option<Workflow>,
    left: DiffSide,
    right: DiffSide,
    focus_left: bool,
}

impl WorkflowDiff {
    pub fn new(namespace: &str, seed: Option<Workflow>) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            seed,
            left: DiffSide::default(),
            right: DiffSide::default(),
            focus_left: true,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "workflow-diff"
    }

    pub fn start(&mut self, ctx: &Ctx) {
        if let Some(seed) = self.seed.take() {
            self.load_side(true, &seed.id, &seed.run_id, ctx);
        }
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn captures_input(&self) -> bool {
        false
    }

    fn load_side(&mut self, left: bool, workflow_id: &str, run_id: &str, ctx: &Ctx) {
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        let workflow_id = workflow_id.to_string();
        let run_id = run_id.to_string();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            HISTORY_DEADLINE,
            async move {
                let workflow = provider
                    .get_workflow(&namespace, &workflow_id, &run_id)
                    .await?;
                let events = provider
                    .get_workflow_history(&namespace, &workflow.id, &workflow.run_id)
                    .await?;
                Ok((workflow, events))
            },
            move |result| ScreenMsg::DiffSideLoaded { left, result },
        );
    }

    fn focused_side_mut(&mut self) -> &mut DiffSide {
        if self.focus_left {
            &mut self.left
        } else {
            &mut self.right
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Tab => {
                self.focus_left = !self.focus_left;
                Vec::new()
            }
            KeyCode::Char('a') => {
                let modal = InputModal::diff_side(self.id, true);
                vec![Action::Push(Box::new(Screen::Input(modal)))]
            }
            KeyCode::Char('b') => {
                let modal = InputModal::diff_side(self.id, false);
                vec![Action::Push(Box::new(Screen::Input(modal)))]
            }
            KeyCode::Char('r') => {
                let targets: Vec<(bool, String, String)> = [
                    (true, &self.left),
                    (false, &self.right),
                ]
                .iter()
                .filter_map(|(is_left, side)| {
                    side.workflow
                        .as_ref()
                        .map(|w| (*is_left, w.id.clone(), w.run_id.clone()))
                })
                .collect();
                for (is_left, id, run_id) in targets {
                    self.load_side(is_left, &id, &run_id, ctx);
                }
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let side = self.focused_side_mut();
                if side.selection + 1 < side.events.len() {
                    side.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let side = self.focused_side_mut();
                side.selection = side.selection.saturating_sub(1);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::DiffRequested { left, workflow_id, run_id } => {
                self.load_side(left, &workflow_id, &run_id, ctx);
                Vec::new()
            }
            ScreenMsg::DiffSideLoaded { left, result } => {
                let side = if left { &mut self.left } else { &mut self.right };
                match result {
                    Ok((workflow, events)) => {
                        side.error = None;
                        side.workflow = Some(workflow);
                        side.events = events.iter().map(|e| e.basic()).collect();
                        side.selection = 0;
                    }
                    Err(err) => side.error = Some(err.to_string()),
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("a", "Set Left"),
            KeyHint::new("b", "Set Right"),
            KeyHint::new("tab", "Switch Side"),
            KeyHint::new("j/k", "Navigate"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("esc", "Back"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let (left_area, right_area) = two_column(area, 50);
        self.draw_side(f, left_area, &self.left, "Workflow A", self.focus_left);
        self.draw_side(f, right_area, &self.right, "Workflow B", !self.focus_left);
    }

    fn draw_side(&self, f: &mut Frame<'_>, area: Rect, side: &DiffSide, label: &str, focused: bool) {
        let t = theme();
        let border = if focused { t.border_focus } else { t.border };
        let title = match &side.workflow {
            Some(w) => format!("{label}: {}", truncate(&w.id, 25)),
            None => label.to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        if let Some(error) = &side.error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        let Some(workflow) = &side.workflow else {
            let hint = if self.left.workflow.is_none() && self.right.workflow.is_none() {
                "No workflows selected.\n\nPress 'a' to set the left workflow,\n'b' to set the right workflow."
            } else {
                "Press 'a'/'b' to set this side."
            };
            f.render_widget(
                Paragraph::new(hint)
                    .style(Style::default().fg(t.text_dim))
                    .block(block),
                area,
            );
            return;
        };

        let inner = area;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(inner);

        let now = Utc::now();
        let duration = match (workflow.end_time, workflow.status) {
            (Some(end), _) => format_duration(end - workflow.start_time),
            (None, WorkflowStatus::Running) => {
                format!("{} (running)", format_duration(now - workflow.start_time))
            }
            _ => "-".to_string(),
        };
        let info = vec![
            Line::from(vec![
                Span::styled("Type: ", Style::default().fg(t.text_dim)),
                Span::styled(workflow.workflow_type.clone(), Style::default().fg(t.text)),
            ]),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(t.text_dim)),
                Span::styled(
                    format!("{} {}", status_icon(workflow.status), workflow.status),
                    Style::default().fg(status_color(workflow.status, &t)),
                ),
            ]),
            Line::from(vec![
                Span::styled("Started: ", Style::default().fg(t.text_dim)),
                Span::styled(
                    workflow.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    Style::default().fg(t.text),
                ),
            ]),
            Line::from(vec![
                Span::styled("Duration: ", Style::default().fg(t.text_dim)),
                Span::styled(duration, Style::default().fg(t.text)),
            ]),
            Line::from(vec![
                Span::styled("Events: ", Style::default().fg(t.text_dim)),
                Span::styled(side.events.len().to_string(), Style::default().fg(t.accent)),
            ]),
            Line::from(vec![
                Span::styled("Task Queue: ", Style::default().fg(t.text_dim)),
                Span::styled(workflow.task_queue.clone(), Style::default().fg(t.text)),
            ]),
        ];
        f.render_widget(Paragraph::new(info).block(block), chunks[0]);

        let rows: Vec<Row> = side
            .events
            .iter()
            .map(|event| {
                Row::new(vec![
                    Span::styled(event.id.to_string(), Style::default().fg(t.text_dim)),
                    Span::styled(
                        truncate(&event.event_type, 28),
                        Style::default().fg(t.text),
                    ),
                    Span::styled(
                        event.time.format("%H:%M:%S").to_string(),
                        Style::default().fg(t.text_dim),
                    ),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(18),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["EVENT", "TYPE", "TIME"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border)),
        )
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        if !side.events.is_empty() {
            state.select(Some(side.selection));
        }
        f.render_stateful_widget(table, chunks[1], &mut state);
    }
}
