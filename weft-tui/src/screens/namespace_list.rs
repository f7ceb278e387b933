//! Namespace list: the root screen. Table left, preview right; drills
//! down into the workflow list and hosts the namespace management forms.

use crate::events::{next_screen_id, Ctx, MutationKind, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, Ticker, DEFAULT_DEADLINE};
use crate::modals::confirm::{ConfirmAction, ConfirmModal};
use crate::modals::input::InputModal;
use crate::screen::{Action, KeyHint, Screen};
use crate::screens::namespace_detail::NamespaceInfo;
use crate::screens::workflow_list::WorkflowList;
use crate::theme::{namespace_state_color, theme};
use crate::widgets::two_column;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weft_core::{Namespace, NamespaceState};

const AUTO_REFRESH_PERIOD: Duration = Duration::from_secs(5);

pub struct NamespaceList {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespaces: Vec<Namespace>,
    selection: usize,
    show_preview: bool,
    loading: bool,
    error: Option<String>,
    ticker: Option<Ticker>,
}

impl NamespaceList {
    pub fn new() -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespaces: Vec::new(),
            selection: 0,
            show_preview: true,
            loading: false,
            error: None,
            ticker: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "namespaces"
    }

    pub fn start(&mut self, ctx: &Ctx) {
        self.load_data(ctx);
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.ticker = None;
    }

    pub fn captures_input(&self) -> bool {
        false
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    fn selected(&self) -> Option<&Namespace> {
        self.namespaces.get(self.selection)
    }

    fn load_data(&mut self, ctx: &Ctx) {
        self.loading = true;
        let provider = Arc::clone(&ctx.provider);
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move { provider.list_namespaces().await },
            ScreenMsg::NamespacesLoaded,
        );
    }

    fn toggle_auto_refresh(&mut self, ctx: &Ctx) {
        match self.ticker.take() {
            Some(ticker) => ticker.stop(),
            None => {
                self.ticker = Some(Ticker::spawn(
                    &ctx.tx,
                    self.id,
                    &self.alive,
                    AUTO_REFRESH_PERIOD,
                ));
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.namespaces.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => match self.selected() {
                Some(ns) => vec![
                    Action::SetNamespace(ns.name.clone()),
                    Action::Push(Box::new(Screen::WorkflowList(WorkflowList::new(&ns.name)))),
                ],
                None => Vec::new(),
            },
            KeyCode::Char('i') => match self.selected() {
                Some(ns) => vec![Action::Push(Box::new(Screen::NamespaceInfo(
                    NamespaceInfo::new(&ns.name),
                )))],
                None => Vec::new(),
            },
            KeyCode::Char('n') => {
                let form = InputModal::namespace_create(self.id);
                vec![Action::Push(Box::new(Screen::Input(form)))]
            }
            KeyCode::Char('e') => match self.selected() {
                Some(ns) => {
                    let retention_days = parse_retention_days(&ns.retention).unwrap_or(30);
                    let form = InputModal::namespace_edit(
                        self.id,
                        &ns.name,
                        retention_days,
                        &ns.description,
                        &ns.owner_email,
                    );
                    vec![Action::Push(Box::new(Screen::Input(form)))]
                }
                None => Vec::new(),
            },
            KeyCode::Char('D') => match self.selected() {
                Some(ns) if ns.state == NamespaceState::Active => {
                    let command = format!(
                        "weft namespace update \\\n  --namespace {} \\\n  --state DEPRECATED",
                        ns.name
                    );
                    let modal = ConfirmModal::new(
                        self.id,
                        "Deprecate Namespace",
                        format!("Deprecate namespace {}?", ns.name),
                        command,
                        ConfirmAction::DeprecateNamespace { name: ns.name.clone() },
                    )
                    .with_warning(
                        "Deprecated namespaces reject new workflows. Existing workflows continue. Reversible.",
                    );
                    vec![Action::Push(Box::new(Screen::Confirm(modal)))]
                }
                _ => Vec::new(),
            },
            KeyCode::Char('p') => {
                self.show_preview = !self.show_preview;
                Vec::new()
            }
            KeyCode::Char('r') => {
                self.load_data(ctx);
                Vec::new()
            }
            KeyCode::Char('a') => {
                self.toggle_auto_refresh(ctx);
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
            ScreenMsg::NamespacesLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(namespaces) => {
                        self.error = None;
                        // Keep the selection by position when it survives
                        // the refresh; otherwise fall back to the top.
                        if self.selection >= namespaces.len() {
                            self.selection = 0;
                        }
                        self.namespaces = namespaces;
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                Vec::new()
            }
            ScreenMsg::MutationDone { kind, result } => {
                match (kind, result) {
                    (
                        MutationKind::CreateNamespace
                        | MutationKind::UpdateNamespace
                        | MutationKind::DeprecateNamespace,
                        outcome,
                    ) => {
                        if let Err(err) = outcome {
                            self.error = Some(err.to_string());
                        }
                        // Refresh either way so the operator sees true state.
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
            KeyHint::new("enter", "Workflows"),
            KeyHint::new("i", "Info"),
            KeyHint::new("n", "Create"),
            KeyHint::new("e", "Edit"),
            KeyHint::new("D", "Deprecate"),
            KeyHint::new("p", "Preview"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("a", "Auto-refresh"),
            KeyHint::new("T", "Theme"),
            KeyHint::new("?", "Help"),
            KeyHint::new("q", "Quit"),
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
        let title = if self.loading {
            "Namespaces (loading…)"
        } else {
            "Namespaces"
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border_focus));

        if let Some(error) = &self.error {
            let text = Paragraph::new(Line::from(Span::styled(
                format!("✗ {error}"),
                Style::default().fg(t.failed),
            )))
            .block(block);
            f.render_widget(text, area);
            return;
        }
        if self.namespaces.is_empty() {
            let text = Paragraph::new(Span::styled(
                "no namespaces",
                Style::default().fg(t.text_dim),
            ))
            .block(block);
            f.render_widget(text, area);
            return;
        }

        let rows: Vec<Row> = self
            .namespaces
            .iter()
            .map(|ns| {
                Row::new(vec![
                    Span::styled(ns.name.clone(), Style::default().fg(t.text)),
                    Span::styled(
                        ns.state.to_string(),
                        Style::default().fg(namespace_state_color(ns.state, &t)),
                    ),
                    Span::styled(ns.retention.clone(), Style::default().fg(t.text_dim)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(25),
                Constraint::Percentage(30),
            ],
        )
        .header(
            Row::new(vec!["NAME", "STATE", "RETENTION"])
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
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border));

        let Some(ns) = self.selected() else {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let state_color = namespace_state_color(ns.state, &t);
        let lines = vec![
            Line::from(Span::styled("Name", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(format!("  {}", ns.name), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("State", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!("  {}", ns.state),
                Style::default().fg(state_color),
            )),
            Line::default(),
            Line::from(Span::styled("Retention", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!("  {}", ns.retention),
                Style::default().fg(t.text),
            )),
            Line::default(),
            Line::from(Span::styled("Description", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!(
                    "  {}",
                    if ns.description.is_empty() { "No description" } else { &ns.description }
                ),
                Style::default().fg(t.text),
            )),
            Line::default(),
            Line::from(Span::styled("Owner", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!(
                    "  {}",
                    if ns.owner_email.is_empty() { "No owner" } else { &ns.owner_email }
                ),
                Style::default().fg(t.text),
            )),
        ];
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Default for NamespaceList {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_retention_days(retention: &str) -> Option<u32> {
    retention.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_parsing() {
        assert_eq!(parse_retention_days("7 days"), Some(7));
        assert_eq!(parse_retention_days("1 day"), Some(1));
        assert_eq!(parse_retention_days("N/A"), None);
    }
}
