//! Full namespace detail view.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, DEFAULT_DEADLINE};
use crate::screen::{Action, KeyHint};
use crate::theme::theme;
use crate::widgets::DetailPanel;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::NamespaceDetail;

pub struct NamespaceInfo {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    detail: Option<NamespaceDetail>,
    loading: bool,
    error: Option<String>,
}

impl NamespaceInfo {
    pub fn new(namespace: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            detail: None,
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "namespace-detail"
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
            async move { provider.describe_namespace(&namespace).await },
            ScreenMsg::NamespaceDescribed,
        );
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        if key.code == KeyCode::Char('r') {
            self.load_data(ctx);
        }
        Vec::new()
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::RefreshTick => self.load_data(ctx),
            ScreenMsg::NamespaceDescribed(result) => {
                self.loading = false;
                match result {
                    Ok(detail) => {
                        self.error = None;
                        self.detail = Some(detail);
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
            }
            _ => {}
        }
        Vec::new()
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        vec![KeyHint::new("r", "Refresh"), KeyHint::new("esc", "Back")]
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        if let Some(error) = &self.error {
            let block = Block::default()
                .title(format!("Namespace: {}", self.namespace))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border_focus));
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

        let Some(detail) = &self.detail else {
            let block = Block::default()
                .title(format!("Namespace: {}", self.namespace))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border_focus));
            f.render_widget(
                Paragraph::new(Span::styled("Loading…", Style::default().fg(t.text_dim)))
                    .block(block),
                area,
            );
            return;
        };

        let ns = &detail.namespace;
        let mut fields = vec![
            ("Name".to_string(), ns.name.clone()),
            ("ID".to_string(), detail.id.clone()),
            ("State".to_string(), ns.state.to_string()),
            ("Retention".to_string(), ns.retention.clone()),
            ("Description".to_string(), ns.description.clone()),
            ("Owner".to_string(), ns.owner_email.clone()),
            ("Global".to_string(), if detail.is_global { "yes" } else { "no" }.to_string()),
            ("History Archival".to_string(), detail.history_archival.clone()),
            ("Visibility Archival".to_string(), detail.visibility_archival.clone()),
            ("Failover Version".to_string(), detail.failover_version.to_string()),
            ("Clusters".to_string(), detail.clusters.join(", ")),
        ];
        for (key, value) in &detail.data {
            fields.push((format!("data.{key}"), value.clone()));
        }
        DetailPanel {
            title: "Namespace",
            fields,
        }
        .render(f, area);
    }
}
