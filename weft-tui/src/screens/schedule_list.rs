//! Schedule list with pause/unpause/trigger/delete actions.

use crate::events::{next_screen_id, Ctx, MutationKind, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE};
use crate::modals::confirm::{ConfirmAction, ConfirmModal};
use crate::screen::{Action, KeyHint, Screen};
use crate::theme::theme;
use crate::widgets::two_column;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{format_relative_time, truncate, Schedule};
use weft_provider::ListOptions;

pub struct ScheduleList {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    schedules: Vec<Schedule>,
    selection: usize,
    show_preview: bool,
    loading: bool,
    error: Option<String>,
}

impl ScheduleList {
    pub fn new(namespace: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            schedules: Vec::new(),
            selection: 0,
            show_preview: true,
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "schedules"
    }

    pub fn start(&mut self, ctx: &Ctx) {
        self.load_data(ctx);
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn captures_input(&self) -> bool {
        false
    }

    fn selected(&self) -> Option<&Schedule> {
        self.schedules.get(self.selection)
    }

    fn load_data(&mut self, ctx: &Ctx) {
        self.loading = true;
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move {
                provider
                    .list_schedules(&namespace, ListOptions::with_page_size(100))
                    .await
                    .map(|(schedules, _token)| schedules)
            },
            ScreenMsg::SchedulesLoaded,
        );
    }

    fn pause_confirm(&self, schedule: &Schedule) -> ConfirmModal {
        let (verb, action) = if schedule.paused {
            (
                "unpause",
                ConfirmAction::UnpauseSchedule {
                    namespace: self.namespace.clone(),
                    schedule_id: schedule.id.clone(),
                    note: "Unpaused via weft".to_string(),
                },
            )
        } else {
            (
                "pause",
                ConfirmAction::PauseSchedule {
                    namespace: self.namespace.clone(),
                    schedule_id: schedule.id.clone(),
                    note: "Paused via weft".to_string(),
                },
            )
        };
        let command = format!(
            "weft schedule {verb} \\\n  --schedule-id {} \\\n  --namespace {}",
            schedule.id, self.namespace
        );
        ConfirmModal::new(
            self.id,
            format!("{} schedule", capitalize(verb)),
            format!("{} schedule {}?", capitalize(verb), schedule.id),
            command,
            action,
        )
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.schedules.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Char('P') => match self.selected() {
                Some(schedule) => {
                    let modal = self.pause_confirm(schedule);
                    vec![Action::Push(Box::new(Screen::Confirm(modal)))]
                }
                None => Vec::new(),
            },
            KeyCode::Char('t') => match self.selected() {
                Some(schedule) => {
                    let command = format!(
                        "weft schedule trigger \\\n  --schedule-id {} \\\n  --namespace {}",
                        schedule.id, self.namespace
                    );
                    let modal = ConfirmModal::new(
                        self.id,
                        "Trigger Schedule",
                        format!("Trigger schedule {} now?", schedule.id),
                        command,
                        ConfirmAction::TriggerSchedule {
                            namespace: self.namespace.clone(),
                            schedule_id: schedule.id.clone(),
                        },
                    );
                    vec![Action::Push(Box::new(Screen::Confirm(modal)))]
                }
                None => Vec::new(),
            },
            KeyCode::Char('D') => match self.selected() {
                Some(schedule) => {
                    let command = format!(
                        "weft schedule delete \\\n  --schedule-id {} \\\n  --namespace {}",
                        schedule.id, self.namespace
                    );
                    let modal = ConfirmModal::new(
                        self.id,
                        "Delete Schedule",
                        format!("Delete schedule {}?", schedule.id),
                        command,
                        ConfirmAction::DeleteSchedule {
                            namespace: self.namespace.clone(),
                            schedule_id: schedule.id.clone(),
                        },
                    )
                    .with_warning("The schedule stops materializing workflows. Irreversible.");
                    vec![Action::Push(Box::new(Screen::Confirm(modal)))]
                }
                None => Vec::new(),
            },
            KeyCode::Char('p') => {
                self.show_preview = !self.show_preview;
                Vec::new()
            }
            KeyCode::Char('r') => {
                self.load_data(ctx);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::RefreshTick => {
                self.load_data(ctx);
                Vec::new()
            }
            ScreenMsg::SchedulesLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(schedules) => {
                        self.error = None;
                        if self.selection >= schedules.len() {
                            self.selection = 0;
                        }
                        self.schedules = schedules;
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                Vec::new()
            }
            ScreenMsg::MutationDone { kind, result } => {
                match kind {
                    MutationKind::PauseSchedule
                    | MutationKind::UnpauseSchedule
                    | MutationKind::TriggerSchedule
                    | MutationKind::DeleteSchedule => {
                        if let Err(err) = result {
                            self.error = Some(err.to_string());
                        }
                        self.load_data(ctx);
                    }
                    _ => {}
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("P", "Pause/Unpause"),
            KeyHint::new("t", "Trigger"),
            KeyHint::new("D", "Delete"),
            KeyHint::new("p", "Preview"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("j/k", "Navigate"),
            KeyHint::new("esc", "Back"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        if self.show_preview {
            let (left, right) = two_column(area, 60);
            self.draw_table(f, left);
            self.draw_preview(f, right);
        } else {
            self.draw_table(f, area);
        }
    }

    fn draw_table(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let title = if self.loading { "Schedules (loading…)" } else { "Schedules" };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border_focus));

        if let Some(error) = &self.error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ Error loading schedules: {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        if self.schedules.is_empty() {
            f.render_widget(
                Paragraph::new(Span::styled("no schedules", Style::default().fg(t.text_dim)))
                    .block(block),
                area,
            );
            return;
        }

        let now = Utc::now();
        let rows: Vec<Row> = self
            .schedules
            .iter()
            .map(|s| {
                let (status, color) = if s.paused {
                    ("Paused", t.canceled)
                } else {
                    ("Active", t.completed)
                };
                let next_run = s
                    .next_run
                    .map(|at| format_relative_time(now, at))
                    .unwrap_or_else(|| "-".to_string());
                Row::new(vec![
                    Span::styled(truncate(&s.id, 24), Style::default().fg(t.text)),
                    Span::styled(truncate(&s.workflow_type, 20), Style::default().fg(t.text_dim)),
                    Span::styled(s.spec.clone(), Style::default().fg(t.text_dim)),
                    Span::styled(status, Style::default().fg(color)),
                    Span::styled(next_run, Style::default().fg(t.text_dim)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(26),
                Constraint::Percentage(24),
                Constraint::Percentage(18),
                Constraint::Percentage(14),
                Constraint::Percentage(18),
            ],
        )
        .header(
            Row::new(vec!["SCHEDULE ID", "WORKFLOW TYPE", "SPEC", "STATUS", "NEXT RUN"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        state.select(Some(self.selection));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn draw_preview(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let block = Block::default()
            .title("Preview")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border));

        let Some(s) = self.selected() else {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let now = Utc::now();
        let (status, status_color) = if s.paused {
            ("Paused", t.canceled)
        } else {
            ("Active", t.completed)
        };
        let next_run = s
            .next_run
            .map(|at| format_relative_time(now, at))
            .unwrap_or_else(|| "-".to_string());
        let last_run = s
            .last_run
            .map(|at| format_relative_time(now, at))
            .unwrap_or_else(|| "-".to_string());

        let lines = vec![
            Line::from(Span::styled(
                "Schedule",
                Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(s.id.clone(), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Status", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(status, Style::default().fg(status_color))),
            Line::default(),
            Line::from(Span::styled("Workflow Type", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(s.workflow_type.clone(), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Spec", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(s.spec.clone(), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Next Run", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(next_run, Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Last Run", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(last_run, Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Total Actions", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                s.total_actions.to_string(),
                Style::default().fg(t.text),
            )),
            Line::default(),
            Line::from(Span::styled("Notes", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(s.notes.clone(), Style::default().fg(t.text_dim))),
        ];
        f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
