//! Batch confirmation modal with per-item progress and an editable
//! reason. The batch call is a single transport round-trip; item results
//! stream into the modal as they settle.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::BATCH_DEADLINE;
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::WorkflowIdentifier;
use weft_provider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Cancel,
    Terminate,
}

impl BatchKind {
    fn verb(&self) -> &'static str {
        match self {
            BatchKind::Cancel => "Cancel",
            BatchKind::Terminate => "Terminate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItemStatus {
    Pending,
    InFlight,
    Completed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub workflow_id: String,
    pub run_id: String,
    pub status: BatchItemStatus,
}

impl BatchItem {
    pub fn pending(workflow_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
            status: BatchItemStatus::Pending,
        }
    }
}

pub struct BatchModal {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    parent: ScreenId,
    kind: BatchKind,
    namespace: String,
    items: Vec<BatchItem>,
    reason: String,
    editing_reason: bool,
    running: bool,
    finished: bool,
    error: Option<String>,
}

impl BatchModal {
    pub fn new(
        parent: ScreenId,
        kind: BatchKind,
        namespace: impl Into<String>,
        items: Vec<BatchItem>,
    ) -> Self {
        let default_reason = match kind {
            BatchKind::Cancel => "Cancelled via weft batch operation",
            BatchKind::Terminate => "Terminated via weft batch operation",
        };
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            parent,
            kind,
            namespace: namespace.into(),
            items,
            reason: default_reason.to_string(),
            editing_reason: false,
            running: false,
            finished: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "batch-confirm"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn captures_input(&self) -> bool {
        self.running || self.editing_reason
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    fn execute(&mut self, ctx: &Ctx) {
        self.running = true;
        for item in &mut self.items {
            item.status = BatchItemStatus::InFlight;
        }

        let provider = Arc::clone(&ctx.provider);
        let tx = ctx.tx.clone();
        let alive = Arc::clone(&self.alive);
        let id = self.id;
        let kind = self.kind;
        let namespace = self.namespace.clone();
        let reason = self.reason.clone();
        let targets: Vec<WorkflowIdentifier> = self
            .items
            .iter()
            .map(|item| WorkflowIdentifier {
                workflow_id: item.workflow_id.clone(),
                run_id: item.run_id.clone(),
            })
            .collect();

        tokio::spawn(async move {
            let call = async {
                match kind {
                    BatchKind::Cancel => {
                        provider.cancel_workflows(&namespace, &targets, &reason).await
                    }
                    BatchKind::Terminate => {
                        provider.terminate_workflows(&namespace, &targets, &reason).await
                    }
                }
            };
            let outcome = match tokio::time::timeout(BATCH_DEADLINE, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::connection(format!(
                    "deadline exceeded after {}s",
                    BATCH_DEADLINE.as_secs()
                ))),
            };
            if !alive.load(Ordering::Acquire) {
                return;
            }
            match outcome {
                Ok(results) => {
                    for (index, result) in results.into_iter().enumerate() {
                        tx.screen(id, ScreenMsg::BatchItemSettled { index, result });
                    }
                    tx.screen(id, ScreenMsg::BatchFinished(Ok(())));
                }
                Err(err) => tx.screen(id, ScreenMsg::BatchFinished(Err(err))),
            }
        });
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        if self.running && !self.finished {
            return Vec::new();
        }
        if self.editing_reason {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.editing_reason = false,
                KeyCode::Backspace => {
                    self.reason.pop();
                }
                KeyCode::Char(c) => self.reason.push(c),
                _ => {}
            }
            return Vec::new();
        }
        if self.finished {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                    vec![Action::Pop, Action::ToScreen(self.parent, ScreenMsg::BatchCompleted)]
                }
                _ => Vec::new(),
            };
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                self.execute(ctx);
                Vec::new()
            }
            KeyCode::Char('e') => {
                self.editing_reason = true;
                Vec::new()
            }
            KeyCode::Esc | KeyCode::Char('n') => vec![Action::Pop],
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::BatchItemSettled { index, result } => {
                if let Some(item) = self.items.get_mut(index) {
                    item.status = if result.success {
                        BatchItemStatus::Completed
                    } else {
                        BatchItemStatus::Failed(
                            result.error.unwrap_or_else(|| "failed".to_string()),
                        )
                    };
                }
                Vec::new()
            }
            ScreenMsg::BatchFinished(result) => {
                self.finished = true;
                if let Err(err) = result {
                    self.error = Some(err.to_string());
                    for item in &mut self.items {
                        if item.status == BatchItemStatus::InFlight {
                            item.status = BatchItemStatus::Failed("batch call failed".to_string());
                        }
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        if self.finished {
            vec![KeyHint::new("enter", "Close")]
        } else {
            vec![
                KeyHint::new("enter", "Confirm"),
                KeyHint::new("e", "Edit Reason"),
                KeyHint::new("esc", "Cancel"),
            ]
        }
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let height = (self.items.len() as u16).min(12) + 9;
        let rect = centered_rect(area, 76, height);
        f.render_widget(Clear, rect);

        let title = format!(" {} {} workflow(s) ", self.kind.verb(), self.items.len());
        let mut lines = Vec::with_capacity(self.items.len() + 6);

        for item in self.items.iter().take(12) {
            let (icon, style, note) = match &item.status {
                BatchItemStatus::Pending => ("○", Style::default().fg(t.text_dim), String::new()),
                BatchItemStatus::InFlight => ("◌", Style::default().fg(t.running), String::new()),
                BatchItemStatus::Completed => ("✓", Style::default().fg(t.completed), String::new()),
                BatchItemStatus::Failed(reason) => {
                    ("✗", Style::default().fg(t.failed), format!("  {reason}"))
                }
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{icon} "), style),
                Span::styled(item.workflow_id.clone(), Style::default().fg(t.text)),
                Span::styled(note, Style::default().fg(t.failed)),
            ]));
        }
        if self.items.len() > 12 {
            lines.push(Line::from(Span::styled(
                format!("… and {} more", self.items.len() - 12),
                Style::default().fg(t.text_dim),
            )));
        }

        lines.push(Line::default());
        let reason_style = if self.editing_reason {
            Style::default().fg(t.accent)
        } else {
            Style::default().fg(t.text_dim)
        };
        lines.push(Line::from(vec![
            Span::styled("Reason: ", Style::default().fg(t.text_dim)),
            Span::styled(self.reason.clone(), reason_style),
            Span::styled(
                if self.editing_reason { "▏" } else { "" },
                Style::default().fg(t.accent),
            ),
        ]));

        if self.kind == BatchKind::Terminate && !self.running {
            lines.push(Line::from(Span::styled(
                "⚠ Termination runs no cleanup code in the workflows.",
                Style::default().fg(t.warning),
            )));
        }
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(t.failed),
            )));
        }

        lines.push(Line::default());
        let footer = if self.finished {
            "[Enter] Close"
        } else if self.running {
            "working…"
        } else {
            "[Enter] Confirm  [e] Edit Reason  [Esc] Cancel"
        };
        lines.push(Line::from(Span::styled(footer, Style::default().fg(t.text_dim))));

        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}
