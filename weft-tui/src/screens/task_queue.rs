//! Task queues. The service exposes no list endpoint, so the queue set
//! is derived from recent workflows; selecting a queue describes it to
//! populate poller info.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::two_column;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{format_relative_time, Poller, TaskQueueType};
use weft_provider::ListOptions;

#[derive(Debug, Clone)]
struct QueueEntry {
    name: String,
    queue_type: TaskQueueType,
    poller_count: usize,
    backlog: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Queues,
    Pollers,
}

pub struct TaskQueues {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    queues: Vec<QueueEntry>,
    pollers: Vec<Poller>,
    selection: usize,
    poller_selection: usize,
    focus: Focus,
    /// Guards against recursive selection handling while a programmatic
    /// refresh reassigns the selection.
    suppress_select: bool,
    loading: bool,
    queue_error: Option<String>,
    poller_error: Option<String>,
}

impl TaskQueues {
    pub fn new(namespace: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            queues: Vec::new(),
            pollers: Vec::new(),
            selection: 0,
            poller_selection: 0,
            focus: Focus::Queues,
            suppress_select: false,
            loading: false,
            queue_error: None,
            poller_error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "task-queues"
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
                let (workflows, _) = provider
                    .list_workflows(&namespace, ListOptions::with_page_size(100))
                    .await?;
                let names: BTreeSet<String> = workflows
                    .into_iter()
                    .filter(|w| !w.task_queue.is_empty())
                    .map(|w| w.task_queue)
                    .collect();
                Ok(names.into_iter().collect::<Vec<_>>())
            },
            ScreenMsg::QueuesDiscovered,
        );
    }

    fn describe_queue(&mut self, index: usize, ctx: &Ctx) {
        let Some(queue) = self.queues.get(index) else { return };
        let name = queue.name.clone();
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        let wrapped = name.clone();
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move { provider.describe_task_queue(&namespace, &name).await },
            move |result| ScreenMsg::QueueDescribed { name: wrapped, result },
        );
    }

    /// Selection changed by the user; a programmatic reassignment under
    /// `suppress_select` must not re-trigger the describe fetch.
    fn on_selection_changed(&mut self, ctx: &Ctx) {
        if self.suppress_select {
            return;
        }
        self.pollers.clear();
        self.poller_error = None;
        self.describe_queue(self.selection, ctx);
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Queues => Focus::Pollers,
                    Focus::Pollers => Focus::Queues,
                };
            }
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Queues => {
                    if self.selection + 1 < self.queues.len() {
                        self.selection += 1;
                        self.on_selection_changed(ctx);
                    }
                }
                Focus::Pollers => {
                    if self.poller_selection + 1 < self.pollers.len() {
                        self.poller_selection += 1;
                    }
                }
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Queues => {
                    if self.selection > 0 {
                        self.selection -= 1;
                        self.on_selection_changed(ctx);
                    }
                }
                Focus::Pollers => {
                    self.poller_selection = self.poller_selection.saturating_sub(1);
                }
            },
            KeyCode::Char('r') => {
                self.describe_queue(self.selection, ctx);
            }
            KeyCode::Char('R') => {
                self.load_data(ctx);
            }
            _ => {}
        }
        Vec::new()
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::RefreshTick => {
                self.load_data(ctx);
                Vec::new()
            }
            ScreenMsg::QueuesDiscovered(result) => {
                self.loading = false;
                match result {
                    Ok(names) => {
                        self.queue_error = None;
                        self.queues = names
                            .into_iter()
                            .map(|name| QueueEntry {
                                name,
                                queue_type: TaskQueueType::Combined,
                                poller_count: 0,
                                backlog: 0,
                            })
                            .collect();
                        // Reassigning the selection here must not recurse
                        // into another describe per row.
                        self.suppress_select = true;
                        if self.selection >= self.queues.len() {
                            self.selection = 0;
                        }
                        self.suppress_select = false;

                        if !self.queues.is_empty() {
                            self.describe_queue(self.selection, ctx);
                        }
                        vec![Action::SetQueueCount(self.queues.len())]
                    }
                    Err(err) => {
                        self.queue_error = Some(err.to_string());
                        Vec::new()
                    }
                }
            }
            ScreenMsg::QueueDescribed { name, result } => {
                match result {
                    Ok((info, pollers)) => {
                        self.poller_error = None;
                        if let Some(entry) = self.queues.iter_mut().find(|q| q.name == name) {
                            entry.poller_count = info.poller_count;
                            entry.backlog = info.backlog;
                            entry.queue_type = info.queue_type;
                        }
                        // Only the currently-selected queue drives the
                        // poller panel; a stale describe is ignored.
                        if self.queues.get(self.selection).map(|q| q.name.as_str())
                            == Some(name.as_str())
                        {
                            self.pollers = pollers;
                            self.poller_selection = 0;
                        }
                    }
                    Err(err) => self.poller_error = Some(err.to_string()),
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("tab", "Switch Panel"),
            KeyHint::new("j/k", "Navigate"),
            KeyHint::new("r", "Refresh Queue"),
            KeyHint::new("R", "Rediscover"),
            KeyHint::new("esc", "Back"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let (left, right) = two_column(area, 50);
        self.draw_queues(f, left);
        self.draw_pollers(f, right);
    }

    fn draw_queues(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let border = if self.focus == Focus::Queues { t.border_focus } else { t.border };
        let title = if self.loading { "Task Queues (loading…)" } else { "Task Queues" };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        if let Some(error) = &self.queue_error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ Error loading task queues: {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        if self.queues.is_empty() {
            f.render_widget(
                Paragraph::new(Span::styled(
                    "no task queues found",
                    Style::default().fg(t.text_dim),
                ))
                .block(block),
                area,
            );
            return;
        }

        let rows: Vec<Row> = self
            .queues
            .iter()
            .map(|q| {
                let backlog_color = if q.backlog > 50 {
                    t.failed
                } else if q.backlog > 10 {
                    t.warning
                } else {
                    t.completed
                };
                Row::new(vec![
                    Span::styled(q.name.clone(), Style::default().fg(t.text)),
                    Span::styled(q.queue_type.to_string(), Style::default().fg(t.text_dim)),
                    Span::styled(q.poller_count.to_string(), Style::default().fg(t.accent)),
                    Span::styled(q.backlog.to_string(), Style::default().fg(backlog_color)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(20),
                Constraint::Percentage(15),
                Constraint::Percentage(20),
            ],
        )
        .header(
            Row::new(vec!["NAME", "TYPE", "POLLERS", "BACKLOG"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        state.select(Some(self.selection));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn draw_pollers(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let border = if self.focus == Focus::Pollers { t.border_focus } else { t.border };
        let block = Block::default()
            .title("Pollers")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        if let Some(error) = &self.poller_error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ Error loading pollers: {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        if self.pollers.is_empty() {
            f.render_widget(
                Paragraph::new(Span::styled(
                    "no active pollers",
                    Style::default().fg(t.text_dim),
                ))
                .block(block),
                area,
            );
            return;
        }

        let now = Utc::now();
        let rows: Vec<Row> = self
            .pollers
            .iter()
            .map(|p| {
                Row::new(vec![
                    Span::styled(p.identity.clone(), Style::default().fg(t.text)),
                    Span::styled(p.queue_type.to_string(), Style::default().fg(t.text_dim)),
                    Span::styled(
                        format_relative_time(now, p.last_access),
                        Style::default().fg(t.text_dim),
                    ),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(50),
                Constraint::Percentage(20),
                Constraint::Percentage(30),
            ],
        )
        .header(
            Row::new(vec!["IDENTITY", "TYPE", "LAST ACCESS"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        state.select(Some(self.poller_selection));
        f.render_stateful_widget(table, area, &mut state);
    }
}
