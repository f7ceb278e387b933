//! Workflow detail: info panel, event-detail panel and events list.
//! Metadata and history load in parallel; every mutation goes through
//! the confirmation pipeline.

use crate::events::{next_screen_id, Ctx, MutationKind, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE, HISTORY_DEADLINE};
use crate::modals::confirm::{ConfirmAction, ConfirmModal};
use crate::modals::input::InputModal;
use crate::modals::reset::{QuickResetModal, ResetPickerModal, ResetTarget};
use crate::screen::{Action, KeyHint, Screen};
use crate::screens::event_history::EventHistory;
use crate::theme::{event_type_color, status_color, status_icon, theme};
use crate::widgets::{parse_details, DetailPanel};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{format_duration, truncate, HistoryEvent, Workflow, WorkflowStatus};

pub struct WorkflowDetail {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    workflow_id: String,
    run_id: String,
    workflow: Option<Workflow>,
    events: Vec<HistoryEvent>,
    selection: usize,
    loading: bool,
    error: Option<String>,
}

impl WorkflowDetail {
    pub fn new(namespace: &str, workflow_id: &str, run_id: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            workflow_id: workflow_id.to_string(),
            run_id: run_id.to_string(),
            workflow: None,
            events: Vec::new(),
            selection: 0,
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "workflow-detail"
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

    pub fn workflow(&self) -> Option<&Workflow> {
        self.workflow.as_ref()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn load_data(&mut self, ctx: &Ctx) {
        self.loading = true;

        // Metadata and history fetch concurrently; each posts on its own.
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        let workflow_id = self.workflow_id.clone();
        let run_id = self.run_id.clone();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move { provider.get_workflow(&namespace, &workflow_id, &run_id).await },
            ScreenMsg::WorkflowLoaded,
        );

        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        let workflow_id = self.workflow_id.clone();
        let run_id = self.run_id.clone();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            HISTORY_DEADLINE,
            async move {
                provider
                    .get_workflow_history(&namespace, &workflow_id, &run_id)
                    .await
            },
            ScreenMsg::HistoryLoaded,
        );
    }

    fn is_running(&self) -> bool {
        self.workflow
            .as_ref()
            .map(|w| w.status == WorkflowStatus::Running)
            .unwrap_or(false)
    }

    fn is_closed(&self) -> bool {
        self.workflow
            .as_ref()
            .map(|w| w.status.is_closed())
            .unwrap_or(false)
    }

    fn cancel_confirm(&self) -> ConfirmModal {
        let command = format!(
            "weft workflow cancel \\\n  --workflow-id {} \\\n  --run-id {} \\\n  --namespace {} \\\n  --reason \"Cancelled via weft\"",
            self.workflow_id, self.run_id, self.namespace
        );
        ConfirmModal::new(
            self.id,
            "Cancel Workflow",
            format!("Cancel workflow {}?", self.workflow_id),
            command,
            ConfirmAction::CancelWorkflow {
                namespace: self.namespace.clone(),
                workflow_id: self.workflow_id.clone(),
                run_id: self.run_id.clone(),
                reason: "Cancelled via weft".to_string(),
            },
        )
    }

    fn terminate_confirm(&self) -> ConfirmModal {
        let command = format!(
            "weft workflow terminate \\\n  --workflow-id {} \\\n  --run-id {} \\\n  --namespace {} \\\n  --reason \"Terminated via weft\"",
            self.workflow_id, self.run_id, self.namespace
        );
        ConfirmModal::new(
            self.id,
            "Terminate Workflow",
            format!("Terminate workflow {}?", self.workflow_id),
            command,
            ConfirmAction::TerminateWorkflow {
                namespace: self.namespace.clone(),
                workflow_id: self.workflow_id.clone(),
                run_id: self.run_id.clone(),
                reason: "Terminated via weft".to_string(),
            },
        )
        .with_warning("This forcefully terminates the workflow. No cleanup code runs.")
    }

    fn delete_confirm(&self) -> ConfirmModal {
        let command = format!(
            "weft workflow delete \\\n  --workflow-id {} \\\n  --run-id {} \\\n  --namespace {}",
            self.workflow_id, self.run_id, self.namespace
        );
        ConfirmModal::new(
            self.id,
            "Delete Workflow",
            format!("Delete workflow {}?", self.workflow_id),
            command,
            ConfirmAction::DeleteWorkflow {
                namespace: self.namespace.clone(),
                workflow_id: self.workflow_id.clone(),
                run_id: self.run_id.clone(),
            },
        )
        .with_warning("This permanently deletes the workflow and its history. Irreversible.")
    }

    fn load_reset_points(&mut self, ctx: &Ctx) {
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        let workflow_id = self.workflow_id.clone();
        let run_id = self.run_id.clone();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move {
                provider
                    .get_reset_points(&namespace, &workflow_id, &run_id)
                    .await
            },
            ScreenMsg::ResetPointsLoaded,
        );
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.events.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Char('e') => vec![Action::Push(Box::new(Screen::EventHistory(
                EventHistory::new(&self.namespace, &self.workflow_id, &self.run_id),
            )))],
            KeyCode::Char('r') => {
                self.load_data(ctx);
                Vec::new()
            }
            KeyCode::Char('c') if self.is_running() => {
                vec![Action::Push(Box::new(Screen::Confirm(self.cancel_confirm())))]
            }
            KeyCode::Char('X') if self.is_running() => {
                vec![Action::Push(Box::new(Screen::Confirm(self.terminate_confirm())))]
            }
            KeyCode::Char('s') if self.is_running() => {
                let modal =
                    InputModal::signal(self.id, &self.namespace, &self.workflow_id, &self.run_id);
                vec![Action::Push(Box::new(Screen::Input(modal)))]
            }
            KeyCode::Char('Q') => {
                if !self.is_running() {
                    self.error = Some("queries require a running workflow".to_string());
                    return Vec::new();
                }
                let modal =
                    InputModal::query(self.id, &self.namespace, &self.workflow_id, &self.run_id);
                vec![Action::Push(Box::new(Screen::Input(modal)))]
            }
            KeyCode::Char('R') if self.is_closed() => {
                self.load_reset_points(ctx);
                Vec::new()
            }
            KeyCode::Char('D') => {
                vec![Action::Push(Box::new(Screen::Confirm(self.delete_confirm())))]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::WorkflowLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(workflow) => {
                        self.error = None;
                        self.workflow = Some(workflow);
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                Vec::new()
            }
            ScreenMsg::HistoryLoaded(result) => {
                if let Ok(events) = result {
                    let position = self.selection;
                    self.events = events.iter().map(|e| e.basic()).collect();
                    self.selection = if position < self.events.len() { position } else { 0 };
                }
                Vec::new()
            }
            ScreenMsg::ResetPointsLoaded(result) => {
                match result {
                    Ok(points) if points.is_empty() => {
                        self.error = Some("no valid reset points for this workflow".to_string());
                        Vec::new()
                    }
                    Ok(points) => {
                        let target = ResetTarget {
                            namespace: self.namespace.clone(),
                            workflow_id: self.workflow_id.clone(),
                            run_id: self.run_id.clone(),
                        };
                        match points.iter().find(|p| p.is_failure_point()).cloned() {
                            Some(failure) => {
                                let modal =
                                    QuickResetModal::new(self.id, target, failure, points);
                                vec![Action::Push(Box::new(Screen::QuickReset(modal)))]
                            }
                            None => {
                                let modal = ResetPickerModal::new(self.id, target, points);
                                vec![Action::Push(Box::new(Screen::ResetPicker(modal)))]
                            }
                        }
                    }
                    Err(err) => {
                        self.error = Some(format!("failed to get reset points: {err}"));
                        Vec::new()
                    }
                }
            }
            ScreenMsg::MutationDone { kind, result } => match kind {
                MutationKind::Delete => match result {
                    Ok(()) => vec![Action::Pop],
                    Err(err) => {
                        self.error = Some(err.to_string());
                        self.load_data(ctx);
                        Vec::new()
                    }
                },
                _ => {
                    if let Err(err) = result {
                        self.error = Some(err.to_string());
                    }
                    self.load_data(ctx);
                    Vec::new()
                }
            },
            ScreenMsg::ResetDone(result) => {
                match result {
                    Ok(new_run_id) => {
                        // Follow the reset into the new run.
                        self.run_id = new_run_id;
                        self.error = None;
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                self.load_data(ctx);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        let mut hints = vec![
            KeyHint::new("e", "Event Graph"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("j/k", "Navigate"),
        ];
        if self.is_running() {
            hints.extend([
                KeyHint::new("c", "Cancel"),
                KeyHint::new("X", "Terminate"),
                KeyHint::new("s", "Signal"),
                KeyHint::new("Q", "Query"),
            ]);
        }
        if self.is_closed() {
            hints.push(KeyHint::new("R", "Reset"));
        }
        hints.extend([KeyHint::new("D", "Delete"), KeyHint::new("esc", "Back")]);
        hints
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[0]);

        self.draw_workflow_panel(f, left[0]);
        self.draw_event_detail(f, left[1]);
        self.draw_events_table(f, columns[1]);
    }

    fn draw_workflow_panel(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        if let Some(error) = &self.error {
            let block = Block::default()
                .title("Workflow")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border));
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

        let Some(w) = &self.workflow else {
            let block = Block::default()
                .title("Workflow")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border));
            f.render_widget(
                Paragraph::new(Span::styled("Loading…", Style::default().fg(t.text_dim)))
                    .block(block),
                area,
            );
            return;
        };

        let now = Utc::now();
        let duration = match (w.end_time, w.status) {
            (Some(end), _) => format_duration(end - w.start_time),
            (None, WorkflowStatus::Running) => format_duration(now - w.start_time),
            _ => "In progress".to_string(),
        };
        let fields = vec![
            ("ID".to_string(), truncate(&w.id, 36)),
            ("Type".to_string(), w.workflow_type.clone()),
            (
                "Status".to_string(),
                format!("{} {}", status_icon(w.status), w.status),
            ),
            (
                "Started".to_string(),
                weft_core::format_relative_time(now, w.start_time),
            ),
            ("Duration".to_string(), duration),
            ("Task Queue".to_string(), w.task_queue.clone()),
            ("Run ID".to_string(), truncate(&w.run_id, 30)),
        ];
        DetailPanel { title: "Workflow", fields }.render(f, area);
    }

    fn draw_event_detail(&self, f: &mut Frame<'_>, area: Rect) {
        let Some(event) = self.events.get(self.selection) else {
            let t = theme();
            let block = Block::default()
                .title("Event Detail")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border));
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let mut fields = vec![
            ("Event ID".to_string(), event.id.to_string()),
            ("Type".to_string(), event.event_type.clone()),
            (
                "Time".to_string(),
                event.time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            ),
        ];
        fields.extend(parse_details(&event.details));
        DetailPanel { title: "Event Detail", fields }.render(f, area);
    }

    fn draw_events_table(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let block = Block::default()
            .title("Events")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border_focus));

        let rows: Vec<Row> = self
            .events
            .iter()
            .map(|event| {
                let color = event_type_color(&event.event_type, &t);
                Row::new(vec![
                    Span::styled(event.id.to_string(), Style::default().fg(t.text_dim)),
                    Span::styled(
                        event.time.format("%H:%M:%S").to_string(),
                        Style::default().fg(t.text_dim),
                    ),
                    Span::styled(truncate(&event.event_type, 34), Style::default().fg(color)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
        )
        .header(
            Row::new(vec!["ID", "TIME", "TYPE"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        if !self.events.is_empty() {
            state.select(Some(self.selection));
        }
        f.render_stateful_widget(table, area, &mut state);
    }
}
