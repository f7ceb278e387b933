//! Generic confirmation modal: title, message, equivalent CLI command,
//! optional warning. On confirm it runs the mutation itself and closes
//! only after the call completes, success or failure; the outcome is
//! forwarded to the invoking screen, which refreshes either way.

use crate::events::{next_screen_id, Ctx, MutationKind, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{NamespaceCreateRequest, NamespaceUpdateRequest};

/// The gated mutation, carried by value so the modal has no reference
/// back into its parent.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    CancelWorkflow {
        namespace: String,
        workflow_id: String,
        run_id: String,
        reason: String,
    },
    TerminateWorkflow {
        namespace: String,
        workflow_id: String,
        run_id: String,
        reason: String,
    },
    DeleteWorkflow {
        namespace: String,
        workflow_id: String,
        run_id: String,
    },
    ResetWorkflow {
        namespace: String,
        workflow_id: String,
        run_id: String,
        event_id: i64,
        reason: String,
    },
    CreateNamespace(NamespaceCreateRequest),
    UpdateNamespace(NamespaceUpdateRequest),
    DeprecateNamespace {
        name: String,
    },
    PauseSchedule {
        namespace: String,
        schedule_id: String,
        note: String,
    },
    UnpauseSchedule {
        namespace: String,
        schedule_id: String,
        note: String,
    },
    TriggerSchedule {
        namespace: String,
        schedule_id: String,
    },
    DeleteSchedule {
        namespace: String,
        schedule_id: String,
    },
}

impl ConfirmAction {
    /// Reset reports through [`ScreenMsg::ResetDone`] instead.
    fn kind(&self) -> Option<MutationKind> {
        Some(match self {
            ConfirmAction::CancelWorkflow { .. } => MutationKind::Cancel,
            ConfirmAction::TerminateWorkflow { .. } => MutationKind::Terminate,
            ConfirmAction::DeleteWorkflow { .. } => MutationKind::Delete,
            ConfirmAction::ResetWorkflow { .. } => return None,
            ConfirmAction::CreateNamespace(_) => MutationKind::CreateNamespace,
            ConfirmAction::UpdateNamespace(_) => MutationKind::UpdateNamespace,
            ConfirmAction::DeprecateNamespace { .. } => MutationKind::DeprecateNamespace,
            ConfirmAction::PauseSchedule { .. } => MutationKind::PauseSchedule,
            ConfirmAction::UnpauseSchedule { .. } => MutationKind::UnpauseSchedule,
            ConfirmAction::TriggerSchedule { .. } => MutationKind::TriggerSchedule,
            ConfirmAction::DeleteSchedule { .. } => MutationKind::DeleteSchedule,
        })
    }
}

pub struct ConfirmModal {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    parent: ScreenId,
    title: String,
    message: String,
    /// Display-only rendering of the equivalent CLI invocation.
    command: String,
    warning: Option<String>,
    action: ConfirmAction,
    busy: bool,
}

impl ConfirmModal {
    pub fn new(
        parent: ScreenId,
        title: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
        action: ConfirmAction,
    ) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            parent,
            title: title.into(),
            message: message.into(),
            command: command.into(),
            warning: None,
            action,
            busy: false,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "confirm"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn captures_input(&self) -> bool {
        self.busy
    }

    fn execute(&mut self, ctx: &Ctx) {
        self.busy = true;
        let provider = Arc::clone(&ctx.provider);
        let action = self.action.clone();

        let Some(kind) = action.kind() else {
            let ConfirmAction::ResetWorkflow {
                namespace,
                workflow_id,
                run_id,
                event_id,
                reason,
            } = action
            else {
                return;
            };
            spawn_fetch(
                &ctx.tx,
                self.id,
                &self.alive,
                DEFAULT_DEADLINE,
                async move {
                    provider
                        .reset_workflow(&namespace, &workflow_id, &run_id, event_id, &reason)
                        .await
                },
                ScreenMsg::ResetDone,
            );
            return;
        };

        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move {
                match action {
                    ConfirmAction::CancelWorkflow { namespace, workflow_id, run_id, reason } => {
                        provider
                            .cancel_workflow(&namespace, &workflow_id, &run_id, &reason)
                            .await
                    }
                    ConfirmAction::TerminateWorkflow { namespace, workflow_id, run_id, reason } => {
                        provider
                            .terminate_workflow(&namespace, &workflow_id, &run_id, &reason)
                            .await
                    }
                    ConfirmAction::DeleteWorkflow { namespace, workflow_id, run_id } => {
                        provider.delete_workflow(&namespace, &workflow_id, &run_id).await
                    }
                    ConfirmAction::ResetWorkflow { .. } => unreachable!("handled above"),
                    ConfirmAction::CreateNamespace(req) => provider.create_namespace(req).await,
                    ConfirmAction::UpdateNamespace(req) => provider.update_namespace(req).await,
                    ConfirmAction::DeprecateNamespace { name } => {
                        provider.deprecate_namespace(&name).await
                    }
                    ConfirmAction::PauseSchedule { namespace, schedule_id, note } => {
                        provider.pause_schedule(&namespace, &schedule_id, &note).await
                    }
                    ConfirmAction::UnpauseSchedule { namespace, schedule_id, note } => {
                        provider.unpause_schedule(&namespace, &schedule_id, &note).await
                    }
                    ConfirmAction::TriggerSchedule { namespace, schedule_id } => {
                        provider.trigger_schedule(&namespace, &schedule_id).await
                    }
                    ConfirmAction::DeleteSchedule { namespace, schedule_id } => {
                        provider.delete_schedule(&namespace, &schedule_id).await
                    }
                }
            },
            move |result| ScreenMsg::MutationDone { kind, result },
        );
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        if self.busy {
            return Vec::new();
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                self.execute(ctx);
                Vec::new()
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => vec![Action::Pop],
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::MutationDone { .. } | ScreenMsg::ResetDone(_) => {
                self.busy = false;
                vec![Action::Pop, Action::ToScreen(self.parent, msg)]
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("enter", "Confirm"),
            KeyHint::new("esc", "Cancel"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let command_lines = self.command.lines().count() as u16;
        let warning_lines = if self.warning.is_some() { 2 } else { 0 };
        let height = 7 + command_lines + warning_lines;
        let rect = centered_rect(area, 72, height);
        f.render_widget(Clear, rect);

        let mut lines = vec![
            Line::from(Span::styled(self.message.clone(), Style::default().fg(t.text))),
            Line::default(),
        ];
        for line in self.command.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(t.accent),
            )));
        }
        if let Some(warning) = &self.warning {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("⚠ {warning}"),
                Style::default().fg(t.warning),
            )));
        }
        lines.push(Line::default());
        let footer = if self.busy {
            "working…"
        } else {
            "[Enter] Confirm  [Esc] Cancel"
        };
        lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(t.text_dim),
        )));

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), rect);
    }
}
