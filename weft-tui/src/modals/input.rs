//! Multi-field input modal (signal, query, diff, namespace forms,
//! save-filter, template values). Submit stays blocked until required
//! fields are present and validators pass.

use crate::events::{next_screen_id, Ctx, MutationKind, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE};
use crate::filter::QueryTemplate;
use crate::modals::confirm::{ConfirmAction, ConfirmModal};
use crate::modals::query_result::QueryResultModal;
use crate::screen::{Action, KeyHint, Screen};
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
use weft_core::{NamespaceCreateRequest, NamespaceUpdateRequest, SavedFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    None,
    /// Must parse as JSON when non-empty.
    Json,
    /// Must parse as a positive integer.
    Numeric,
}

#[derive(Debug, Clone)]
pub struct InputField {
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
    pub validator: Validator,
    pub locked: bool,
    pub value: String,
}

impl InputField {
    pub fn new(name: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            name,
            label,
            placeholder,
            required: false,
            validator: Validator::None,
            locked: false,
            value: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.validator = Validator::Json;
        self
    }

    pub fn numeric(mut self) -> Self {
        self.validator = Validator::Numeric;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn validate(&self) -> Result<(), String> {
        let value = self.value.trim();
        if value.is_empty() {
            if self.required {
                return Err(format!("{} is required", self.label));
            }
            return Ok(());
        }
        match self.validator {
            Validator::None => Ok(()),
            Validator::Json => serde_json::from_str::<serde_json::Value>(value)
                .map(|_| ())
                .map_err(|e| format!("{}: invalid JSON ({e})", self.label)),
            Validator::Numeric => value
                .parse::<u32>()
                .map(|_| ())
                .map_err(|_| format!("{} must be a positive number", self.label)),
        }
    }
}

/// What the collected values are for.
#[derive(Debug, Clone)]
pub enum InputPurpose {
    Signal {
        namespace: String,
        workflow_id: String,
        run_id: String,
    },
    Query {
        namespace: String,
        workflow_id: String,
        run_id: String,
    },
    DiffSide {
        left: bool,
    },
    NamespaceCreate,
    NamespaceEdit,
    SaveFilter {
        query: String,
    },
    TemplateValue {
        template: QueryTemplate,
    },
}

pub struct InputModal {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    parent: ScreenId,
    title: String,
    message: String,
    fields: Vec<InputField>,
    purpose: InputPurpose,
    focus: usize,
    error: Option<String>,
    busy: bool,
}

impl InputModal {
    pub fn new(
        parent: ScreenId,
        title: impl Into<String>,
        message: impl Into<String>,
        fields: Vec<InputField>,
        purpose: InputPurpose,
    ) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            parent,
            title: title.into(),
            message: message.into(),
            fields,
            purpose,
            focus: 0,
            error: None,
            busy: false,
        }
    }

    pub fn signal(parent: ScreenId, namespace: &str, workflow_id: &str, run_id: &str) -> Self {
        Self::new(
            parent,
            "Signal Workflow",
            format!("Send signal to workflow {workflow_id}"),
            vec![
                InputField::new("signalName", "Signal Name", "e.g. approve, cancel, update")
                    .required(),
                InputField::new("input", "Input (JSON)", r#"e.g. {"approved": true}"#).json(),
            ],
            InputPurpose::Signal {
                namespace: namespace.to_string(),
                workflow_id: workflow_id.to_string(),
                run_id: run_id.to_string(),
            },
        )
    }

    pub fn query(parent: ScreenId, namespace: &str, workflow_id: &str, run_id: &str) -> Self {
        Self::new(
            parent,
            "Query Workflow",
            format!("Execute query on workflow {workflow_id}"),
            vec![
                InputField::new("queryType", "Query Type", "__stack_trace or custom handler")
                    .required(),
                InputField::new("args", "Arguments (JSON)", r#"e.g. {"key": "value"}"#).json(),
            ],
            InputPurpose::Query {
                namespace: namespace.to_string(),
                workflow_id: workflow_id.to_string(),
                run_id: run_id.to_string(),
            },
        )
    }

    pub fn diff_side(parent: ScreenId, left: bool) -> Self {
        let side = if left { "Left" } else { "Right" };
        Self::new(
            parent,
            format!("Set {side} Workflow"),
            "Enter a workflow to compare",
            vec![
                InputField::new("workflowId", "Workflow ID", "workflow-id").required(),
                InputField::new("runId", "Run ID", "(optional)"),
            ],
            InputPurpose::DiffSide { left },
        )
    }

    pub fn namespace_create(parent: ScreenId) -> Self {
        Self::new(
            parent,
            "Create Namespace",
            "Register a new namespace",
            vec![
                InputField::new("name", "Name", "my-namespace").required(),
                InputField::new("retention", "Retention (days)", "7").required().numeric(),
                InputField::new("description", "Description", "(optional)"),
                InputField::new("owner", "Owner Email", "(optional)"),
            ],
            InputPurpose::NamespaceCreate,
        )
    }

    pub fn namespace_edit(
        parent: ScreenId,
        name: &str,
        retention_days: u32,
        description: &str,
        owner: &str,
    ) -> Self {
        Self::new(
            parent,
            "Edit Namespace",
            format!("Update namespace {name}"),
            vec![
                InputField::new("name", "Name", "").with_value(name).required().locked(),
                InputField::new("retention", "Retention (days)", "7")
                    .with_value(retention_days.to_string())
                    .required()
                    .numeric(),
                InputField::new("description", "Description", "(optional)").with_value(description),
                InputField::new("owner", "Owner Email", "(optional)").with_value(owner),
            ],
            InputPurpose::NamespaceEdit,
        )
    }

    pub fn save_filter(parent: ScreenId, query: &str) -> Self {
        Self::new(
            parent,
            "Save Filter",
            format!("Save query: {query}"),
            vec![
                InputField::new("name", "Name", "my-filter").required(),
                InputField::new("default", "Default (y/n)", "n"),
            ],
            InputPurpose::SaveFilter { query: query.to_string() },
        )
    }

    pub fn template_value(parent: ScreenId, template: QueryTemplate) -> Self {
        let placeholder = template.placeholder().unwrap_or("value");
        Self::new(
            parent,
            "Query Value",
            format!("Enter value for {placeholder}:"),
            vec![InputField::new("value", "Value", "e.g. OrderWorkflow").required()],
            InputPurpose::TemplateValue { template },
        )
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "input"
    }

    pub fn start(&mut self, _ctx: &Ctx) {}

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn captures_input(&self) -> bool {
        true
    }

    fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.trim())
            .unwrap_or("")
    }

    fn json_value(&self, name: &str) -> Option<serde_json::Value> {
        let raw = self.value(name);
        if raw.is_empty() {
            return None;
        }
        serde_json::from_str(raw).ok()
    }

    fn submit(&mut self, ctx: &Ctx) -> Vec<Action> {
        for field in &self.fields {
            if let Err(message) = field.validate() {
                self.error = Some(message);
                return Vec::new();
            }
        }
        self.error = None;

        match self.purpose.clone() {
            InputPurpose::Signal { namespace, workflow_id, run_id } => {
                self.busy = true;
                let provider = Arc::clone(&ctx.provider);
                let signal_name = self.value("signalName").to_string();
                let input = self.json_value("input");
                spawn_fetch(
                    &ctx.tx,
                    self.id,
                    &self.alive,
                    DEFAULT_DEADLINE,
                    async move {
                        provider
                            .signal_workflow(&namespace, &workflow_id, &run_id, &signal_name, input)
                            .await
                    },
                    |result| ScreenMsg::MutationDone { kind: MutationKind::Signal, result },
                );
                Vec::new()
            }
            InputPurpose::Query { namespace, workflow_id, run_id } => {
                self.busy = true;
                let provider = Arc::clone(&ctx.provider);
                let query_type = self.value("queryType").to_string();
                let wrapped_type = query_type.clone();
                let args = self.json_value("args");
                spawn_fetch(
                    &ctx.tx,
                    self.id,
                    &self.alive,
                    DEFAULT_DEADLINE,
                    async move {
                        provider
                            .query_workflow(&namespace, &workflow_id, &run_id, &query_type, args)
                            .await
                    },
                    move |result| ScreenMsg::QueryDone { query_type: wrapped_type, result },
                );
                Vec::new()
            }
            InputPurpose::DiffSide { left } => vec![
                Action::Pop,
                Action::ToScreen(
                    self.parent,
                    ScreenMsg::DiffRequested {
                        left,
                        workflow_id: self.value("workflowId").to_string(),
                        run_id: self.value("runId").to_string(),
                    },
                ),
            ],
            InputPurpose::NamespaceCreate => {
                let req = NamespaceCreateRequest {
                    name: self.value("name").to_string(),
                    description: self.value("description").to_string(),
                    owner_email: self.value("owner").to_string(),
                    retention_days: self.value("retention").parse().unwrap_or(7),
                };
                let command = format!(
                    "weft namespace register \\\n  --namespace {} \\\n  --retention {}d",
                    req.name, req.retention_days
                );
                let confirm = ConfirmModal::new(
                    self.parent,
                    "Create Namespace",
                    format!("Create namespace {}?", req.name),
                    command,
                    ConfirmAction::CreateNamespace(req),
                );
                vec![Action::Pop, Action::Push(Box::new(Screen::Confirm(confirm)))]
            }
            InputPurpose::NamespaceEdit => {
                let req = NamespaceUpdateRequest {
                    name: self.value("name").to_string(),
                    description: self.value("description").to_string(),
                    owner_email: self.value("owner").to_string(),
                    retention_days: self.value("retention").parse().unwrap_or(7),
                };
                let command = format!(
                    "weft namespace update \\\n  --namespace {} \\\n  --retention {}d \\\n  --description \"{}\"",
                    req.name, req.retention_days, req.description
                );
                let confirm = ConfirmModal::new(
                    self.parent,
                    "Update Namespace",
                    format!("Update namespace {}?", req.name),
                    command,
                    ConfirmAction::UpdateNamespace(req),
                );
                vec![Action::Pop, Action::Push(Box::new(Screen::Confirm(confirm)))]
            }
            InputPurpose::SaveFilter { query } => {
                let filter = SavedFilter {
                    name: self.value("name").to_string(),
                    query,
                    is_default: self.value("default").eq_ignore_ascii_case("y"),
                };
                vec![Action::Pop, Action::SaveFilter(filter)]
            }
            InputPurpose::TemplateValue { template } => {
                let query = template.fill(self.value("value"));
                vec![
                    Action::Pop,
                    Action::ToScreen(self.parent, ScreenMsg::QueryComposed(query)),
                ]
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        if self.busy {
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc => vec![Action::Pop],
            KeyCode::Enter => self.submit(ctx),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % self.fields.len();
                Vec::new()
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = if self.focus == 0 {
                    self.fields.len() - 1
                } else {
                    self.focus - 1
                };
                Vec::new()
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    if !field.locked {
                        field.value.pop();
                    }
                }
                Vec::new()
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    if !field.locked {
                        field.value.push(c);
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, _ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::MutationDone { .. } => {
                self.busy = false;
                vec![Action::Pop, Action::ToScreen(self.parent, msg)]
            }
            ScreenMsg::QueryDone { query_type, result } => {
                self.busy = false;
                let modal = match result {
                    Ok(outcome) => match outcome.error {
                        Some(err) => QueryResultModal::error(&query_type, &err),
                        None => QueryResultModal::result(&query_type, &outcome.result),
                    },
                    Err(err) => QueryResultModal::error(&query_type, &err.to_string()),
                };
                vec![
                    Action::Pop,
                    Action::Push(Box::new(Screen::QueryResult(modal))),
                ]
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("tab", "Next Field"),
            KeyHint::new("enter", "Submit"),
            KeyHint::new("esc", "Cancel"),
        ]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let height = (self.fields.len() as u16) * 2 + 7;
        let rect = centered_rect(area, 64, height);
        f.render_widget(Clear, rect);

        let mut lines = vec![
            Line::from(Span::styled(self.message.clone(), Style::default().fg(t.text_dim))),
            Line::default(),
        ];
        for (i, field) in self.fields.iter().enumerate() {
            let marker = if i == self.focus { "› " } else { "  " };
            let label_style = if i == self.focus {
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(t.text_dim)
            };
            let required = if field.required { "*" } else { "" };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}{required}", field.label),
                label_style,
            )));
            let (value, value_style) = if field.value.is_empty() {
                (field.placeholder.to_string(), Style::default().fg(t.text_dim))
            } else {
                (field.value.clone(), Style::default().fg(t.text))
            };
            let cursor = if i == self.focus && !field.locked { "▏" } else { "" };
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(value, value_style),
                Span::styled(cursor, Style::default().fg(t.accent)),
            ]));
        }
        lines.push(Line::default());
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(t.failed),
            )));
        } else if self.busy {
            lines.push(Line::from(Span::styled(
                "working…",
                Style::default().fg(t.text_dim),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "[Enter] Submit  [Tab] Next  [Esc] Cancel",
                Style::default().fg(t.text_dim),
            )));
        }

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}
