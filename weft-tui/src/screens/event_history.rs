//! Event history with three view modes: flat list, aggregated tree and
//! zoomable timeline.

use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::{spawn_fetch, HISTORY_DEADLINE};
use crate::screen::{Action, KeyHint};
use crate::theme::{event_type_color, theme};
use crate::widgets::timeline::{scroll, zoom_in, zoom_out, TimelineWidget};
use crate::widgets::{parse_details, two_column, visible_nodes, DetailPanel, EventTreeWidget};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{build_event_tree, format_duration, truncate, EnhancedHistoryEvent, EventTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Tree,
    Timeline,
}

impl ViewMode {
    fn next(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Tree,
            ViewMode::Tree => ViewMode::Timeline,
            ViewMode::Timeline => ViewMode::List,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ViewMode::List => "Events (List)",
            ViewMode::Tree => "Events (Tree)",
            ViewMode::Timeline => "Events (Timeline)",
        }
    }
}

pub struct EventHistory {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    workflow_id: String,
    run_id: String,
    events: Vec<EnhancedHistoryEvent>,
    tree: EventTree,
    mode: ViewMode,
    list_selection: usize,
    expanded: HashSet<usize>,
    /// Position within the visible-node order of the tree view.
    tree_selection: usize,
    zoom: u32,
    offset: f64,
    /// Index into `tree.nodes` for the timeline.
    lane_selection: usize,
    side_panel: bool,
    loading: bool,
    error: Option<String>,
}

impl EventHistory {
    pub fn new(namespace: &str, workflow_id: &str, run_id: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            workflow_id: workflow_id.to_string(),
            run_id: run_id.to_string(),
            events: Vec::new(),
            tree: EventTree::default(),
            mode: ViewMode::Tree,
            list_selection: 0,
            expanded: HashSet::new(),
            tree_selection: 0,
            zoom: 1,
            offset: 0.0,
            lane_selection: 0,
            side_panel: true,
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "events"
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

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn tree(&self) -> &EventTree {
        &self.tree
    }

    fn load_data(&mut self, ctx: &Ctx) {
        self.loading = true;
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

    fn expand_all(&mut self) {
        self.expanded = (0..self.tree.nodes.len()).collect();
    }

    fn collapse_all(&mut self) {
        self.expanded.clear();
        self.tree_selection = 0;
    }

    fn jump_to_failed(&mut self) {
        let Some(failed) = self.tree.first_failed() else { return };
        // Make the node visible by expanding every ancestor.
        let mut current = self.tree.nodes[failed].parent;
        while let Some(parent) = current {
            self.expanded.insert(parent);
            current = self.tree.nodes[parent].parent;
        }
        let order = visible_nodes(&self.tree, &self.expanded);
        if let Some(pos) = order.iter().position(|&idx| idx == failed) {
            self.tree_selection = pos;
        }
        self.lane_selection = failed;
    }

    fn selected_tree_node(&self) -> Option<usize> {
        let order = visible_nodes(&self.tree, &self.expanded);
        order.get(self.tree_selection).copied()
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        match key.code {
            KeyCode::Char('v') => {
                self.mode = self.mode.next();
                return Vec::new();
            }
            KeyCode::Char('1') => {
                self.mode = ViewMode::List;
                return Vec::new();
            }
            KeyCode::Char('2') => {
                self.mode = ViewMode::Tree;
                return Vec::new();
            }
            KeyCode::Char('3') => {
                self.mode = ViewMode::Timeline;
                return Vec::new();
            }
            KeyCode::Char('p') => {
                self.side_panel = !self.side_panel;
                return Vec::new();
            }
            KeyCode::Char('r') => {
                self.load_data(ctx);
                return Vec::new();
            }
            _ => {}
        }

        match self.mode {
            ViewMode::List => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.list_selection + 1 < self.events.len() {
                        self.list_selection += 1;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.list_selection = self.list_selection.saturating_sub(1);
                }
                _ => {}
            },
            ViewMode::Tree => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    let visible = visible_nodes(&self.tree, &self.expanded).len();
                    if self.tree_selection + 1 < visible {
                        self.tree_selection += 1;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.tree_selection = self.tree_selection.saturating_sub(1);
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    if let Some(idx) = self.selected_tree_node() {
                        if !self.expanded.remove(&idx) {
                            self.expanded.insert(idx);
                        }
                    }
                }
                KeyCode::Char('e') => self.expand_all(),
                KeyCode::Char('c') => self.collapse_all(),
                KeyCode::Char('f') => self.jump_to_failed(),
                _ => {}
            },
            ViewMode::Timeline => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.lane_selection + 1 < self.tree.nodes.len() {
                        self.lane_selection += 1;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.lane_selection = self.lane_selection.saturating_sub(1);
                }
                KeyCode::Char('+') | KeyCode::Char('=') => self.zoom = zoom_in(self.zoom),
                KeyCode::Char('-') => {
                    self.zoom = zoom_out(self.zoom);
                    if self.zoom == 1 {
                        self.offset = 0.0;
                    }
                }
                KeyCode::Char('h') | KeyCode::Left => self.offset = scroll(self.offset, -1),
                KeyCode::Char('l') | KeyCode::Right => self.offset = scroll(self.offset, 1),
                _ => {}
            },
        }
        Vec::new()
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        match msg {
            ScreenMsg::RefreshTick => {
                self.load_data(ctx);
                Vec::new()
            }
            ScreenMsg::HistoryLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(events) => {
                        self.error = None;
                        self.tree = build_event_tree(&events);
                        self.events = events;
                        self.expand_all();
                        let visible = visible_nodes(&self.tree, &self.expanded).len();
                        if self.tree_selection >= visible {
                            self.tree_selection = 0;
                        }
                        if self.list_selection >= self.events.len() {
                            self.list_selection = 0;
                        }
                        if self.lane_selection >= self.tree.nodes.len() {
                            self.lane_selection = 0;
                        }
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        let mut hints = vec![
            KeyHint::new("v", "Cycle View"),
            KeyHint::new("1/2/3", "List/Tree/Timeline"),
            KeyHint::new("p", "Preview"),
            KeyHint::new("r", "Refresh"),
        ];
        match self.mode {
            ViewMode::Tree => hints.extend([
                KeyHint::new("e", "Expand All"),
                KeyHint::new("c", "Collapse All"),
                KeyHint::new("f", "Jump to Failed"),
            ]),
            ViewMode::Timeline => hints.extend([
                KeyHint::new("+/-", "Zoom"),
                KeyHint::new("h/l", "Scroll"),
            ]),
            ViewMode::List => {}
        }
        hints.extend([KeyHint::new("j/k", "Navigate"), KeyHint::new("esc", "Back")]);
        hints
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        if self.side_panel {
            let (left, right) = two_column(area, 60);
            self.draw_main(f, left);
            self.draw_side_panel(f, right);
        } else {
            self.draw_main(f, area);
        }
    }

    fn draw_main(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        if let Some(error) = &self.error {
            let block = Block::default()
                .title(self.mode.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.border_focus));
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ Error loading events: {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }

        match self.mode {
            ViewMode::List => self.draw_list(f, area),
            ViewMode::Tree => EventTreeWidget {
                title: self.mode.title(),
                tree: &self.tree,
                expanded: &self.expanded,
                selected: Some(self.tree_selection),
                focused: true,
            }
            .render(f, area),
            ViewMode::Timeline => TimelineWidget {
                title: self.mode.title(),
                tree: &self.tree,
                zoom: self.zoom,
                offset: self.offset,
                selected: Some(self.lane_selection),
            }
            .render(f, area),
        }
    }

    fn draw_list(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let block = Block::default()
            .title(self.mode.title())
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
                    Span::styled(truncate(&event.event_type, 32), Style::default().fg(color)),
                    Span::styled(truncate(&event.details, 48), Style::default().fg(t.text_dim)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Percentage(40),
                Constraint::Percentage(50),
            ],
        )
        .header(
            Row::new(vec!["ID", "TIME", "TYPE", "DETAILS"])
                .style(Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .highlight_style(Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        if !self.events.is_empty() {
            state.select(Some(self.list_selection));
        }
        f.render_stateful_widget(table, area, &mut state);
    }

    fn draw_side_panel(&self, f: &mut Frame<'_>, area: Rect) {
        match self.mode {
            ViewMode::List => {
                let Some(event) = self.events.get(self.list_selection) else {
                    DetailPanel { title: "Details", fields: Vec::new() }.render(f, area);
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
                DetailPanel { title: "Details", fields }.render(f, area);
            }
            ViewMode::Tree | ViewMode::Timeline => {
                let node_idx = match self.mode {
                    ViewMode::Tree => self.selected_tree_node(),
                    _ => self.tree.nodes.get(self.lane_selection).map(|_| self.lane_selection),
                };
                let Some(idx) = node_idx else {
                    DetailPanel { title: "Details", fields: Vec::new() }.render(f, area);
                    return;
                };
                let node = &self.tree.nodes[idx];

                let duration = node
                    .duration()
                    .map(format_duration)
                    .unwrap_or_else(|| "running…".to_string());
                let mut fields = vec![
                    ("Name".to_string(), node.name.clone()),
                    ("Status".to_string(), node.status.to_string()),
                    ("Duration".to_string(), duration),
                    (
                        "Start Time".to_string(),
                        node.start_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                    ),
                ];
                if node.attempts > 1 {
                    fields.push(("Attempts".to_string(), node.attempts.to_string()));
                }
                fields.push((String::new(), String::new()));
                for event in &node.events {
                    fields.push((format!("#{}", event.id), event.event_type.clone()));
                }
                DetailPanel { title: "Details", fields }.render(f, area);
            }
        }
    }
}
