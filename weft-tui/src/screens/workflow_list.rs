//! Workflow list with preview, substring filter, visibility queries,
//! multi-select and batch operations.

use crate::clipboard::copy_to_clipboard;
use crate::events::{next_screen_id, Ctx, ScreenId, ScreenMsg};
use crate::fetch::{post_after, spawn_fetch, Ticker, DEFAULT_DEADLINE};
use crate::filter::{
    clear_date_clauses, combine_date_clause, matches_filter, resolve_time_placeholders,
    SearchHistory,
};
use crate::modals::batch::{BatchItem, BatchKind, BatchModal};
use crate::modals::date_range::DateRangeModal;
use crate::modals::input::InputModal;
use crate::modals::saved_filters::FilterPickerModal;
use crate::modals::templates::TemplatePickerModal;
use crate::modals::visibility::VisibilityInputModal;
use crate::screen::{Action, KeyHint, Screen};
use crate::screens::schedule_list::ScheduleList;
use crate::screens::task_queue::TaskQueues;
use crate::screens::workflow_detail::WorkflowDetail;
use crate::screens::workflow_diff::WorkflowDiff;
use crate::theme::{status_color, status_icon, theme};
use crate::widgets::{two_column, WorkflowStats};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weft_core::{format_relative_time, truncate, Workflow, WorkflowStatus};
use weft_provider::ListOptions;

const AUTO_REFRESH_PERIOD: Duration = Duration::from_secs(5);
const FLASH_DURATION: Duration = Duration::from_millis(1500);
const PAGE_SIZE: usize = 100;

pub struct WorkflowList {
    id: ScreenId,
    alive: Arc<AtomicBool>,
    namespace: String,
    all_workflows: Vec<Workflow>,
    visible: Vec<Workflow>,
    filter_text: String,
    filter_active: bool,
    visibility_query: String,
    history: SearchHistory,
    selection: usize,
    select_mode: bool,
    selected_rows: HashSet<usize>,
    show_preview: bool,
    loading: bool,
    error: Option<String>,
    flash: Option<String>,
    ticker: Option<Ticker>,
}

impl WorkflowList {
    pub fn new(namespace: &str) -> Self {
        Self {
            id: next_screen_id(),
            alive: Arc::new(AtomicBool::new(true)),
            namespace: namespace.to_string(),
            all_workflows: Vec::new(),
            visible: Vec::new(),
            filter_text: String::new(),
            filter_active: false,
            visibility_query: String::new(),
            history: SearchHistory::new(),
            selection: 0,
            select_mode: false,
            selected_rows: HashSet::new(),
            show_preview: true,
            loading: false,
            error: None,
            flash: None,
            ticker: None,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        "workflows"
    }

    pub fn start(&mut self, ctx: &Ctx) {
        // The default saved filter, when one exists, seeds the first query.
        if let Some(query) = ctx.with_config(|c| c.default_filter().map(|f| f.query.clone())) {
            self.visibility_query = query;
        }
        self.load_data(ctx);
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.ticker = None;
    }

    pub fn captures_input(&self) -> bool {
        self.filter_active
    }

    pub fn visible(&self) -> &[Workflow] {
        &self.visible
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn visibility_query(&self) -> &str {
        &self.visibility_query
    }

    fn selected(&self) -> Option<&Workflow> {
        self.visible.get(self.selection)
    }

    fn load_data(&mut self, ctx: &Ctx) {
        self.loading = true;
        let provider = Arc::clone(&ctx.provider);
        let namespace = self.namespace.clone();
        // Time placeholders resolve at fetch time, not composition time.
        let query = resolve_time_placeholders(&self.visibility_query, Utc::now());
        spawn_fetch(
            &ctx.tx,
            self.id,
            &self.alive,
            DEFAULT_DEADLINE,
            async move {
                let opts = ListOptions {
                    page_size: PAGE_SIZE,
                    query,
                    ..Default::default()
                };
                provider
                    .list_workflows(&namespace, opts)
                    .await
                    .map(|(workflows, _token)| workflows)
            },
            ScreenMsg::WorkflowsLoaded,
        );
    }

    /// Rebuilds the visible set from the full set. The selected item stays
    /// selected by identity across filter changes; multi-selection refers
    /// into the visible set, so it is cleared.
    fn apply_filter(&mut self) -> Vec<Action> {
        let selected_key = self
            .selected()
            .map(|w| (w.id.clone(), w.run_id.clone()));

        self.visible = self
            .all_workflows
            .iter()
            .filter(|w| matches_filter(w, &self.filter_text))
            .cloned()
            .collect();
        self.selected_rows.clear();

        self.selection = selected_key
            .and_then(|(id, run_id)| {
                self.visible
                    .iter()
                    .position(|w| w.id == id && w.run_id == run_id)
            })
            .unwrap_or(0);

        vec![Action::SetStats(self.stats())]
    }

    fn stats(&self) -> WorkflowStats {
        let mut stats = WorkflowStats::default();
        for workflow in &self.visible {
            match workflow.status {
                WorkflowStatus::Running => stats.running += 1,
                WorkflowStatus::Completed => stats.completed += 1,
                WorkflowStatus::Failed => stats.failed += 1,
                _ => {}
            }
        }
        stats
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

    fn copy_selected_id(&mut self, ctx: &Ctx) {
        let Some(workflow) = self.selected() else { return };
        let id = workflow.id.clone();
        match copy_to_clipboard(&id) {
            Ok(()) => {
                self.flash = Some(format!("Copied to clipboard\n\n{id}"));
                post_after(
                    &ctx.tx,
                    self.id,
                    &self.alive,
                    FLASH_DURATION,
                    ScreenMsg::FlashExpired,
                );
            }
            Err(err) => self.flash = Some(format!("Failed to copy: {err}")),
        }
    }

    fn batch_items(&self) -> Vec<BatchItem> {
        let mut indices: Vec<usize> = self.selected_rows.iter().copied().collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|i| self.visible.get(i))
            .map(|w| BatchItem::pending(w.id.clone(), w.run_id.clone()))
            .collect()
    }

    fn set_query(&mut self, query: String, ctx: &Ctx) -> Vec<Action> {
        self.history.add(&query);
        self.visibility_query = query;
        self.filter_text.clear();
        self.load_data(ctx);
        Vec::new()
    }

    fn on_filter_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.filter_active = false;
                Vec::new()
            }
            KeyCode::Backspace => {
                self.filter_text.pop();
                self.apply_filter()
            }
            KeyCode::Char(c) => {
                self.filter_text.push(c);
                self.apply_filter()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        if self.filter_active {
            return self.on_filter_key(key);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('a') && self.select_mode {
                self.selected_rows = (0..self.visible.len()).collect();
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < self.visible.len() {
                    self.selection += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter => match self.selected() {
                Some(w) => vec![Action::Push(Box::new(Screen::WorkflowDetail(
                    WorkflowDetail::new(&self.namespace, &w.id, &w.run_id),
                )))],
                None => Vec::new(),
            },
            KeyCode::Char(' ') if self.select_mode => {
                if self.selection < self.visible.len() {
                    if !self.selected_rows.remove(&self.selection) {
                        self.selected_rows.insert(self.selection);
                    }
                }
                Vec::new()
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
                Vec::new()
            }
            KeyCode::Char('F') => {
                let modal = VisibilityInputModal::new(
                    self.id,
                    &self.visibility_query,
                    self.history.clone(),
                );
                vec![Action::Push(Box::new(Screen::VisibilityInput(modal)))]
            }
            KeyCode::Char('f') => vec![Action::Push(Box::new(Screen::TemplatePicker(
                TemplatePickerModal::new(self.id),
            )))],
            KeyCode::Char('D') => vec![Action::Push(Box::new(Screen::DateRange(
                DateRangeModal::new(self.id),
            )))],
            KeyCode::Char('C') => {
                if self.visibility_query.is_empty() {
                    Vec::new()
                } else {
                    self.visibility_query.clear();
                    self.load_data(ctx);
                    Vec::new()
                }
            }
            KeyCode::Char('L') => {
                let filters = ctx.with_config(|c| c.saved_filters.clone());
                let modal = FilterPickerModal::new(self.id, filters, &self.visibility_query);
                vec![Action::Push(Box::new(Screen::FilterPicker(modal)))]
            }
            KeyCode::Char('S') => {
                if self.visibility_query.is_empty() {
                    Vec::new()
                } else {
                    let modal = InputModal::save_filter(self.id, &self.visibility_query);
                    vec![Action::Push(Box::new(Screen::Input(modal)))]
                }
            }
            KeyCode::Char('v') => {
                self.select_mode = !self.select_mode;
                if !self.select_mode {
                    self.selected_rows.clear();
                }
                Vec::new()
            }
            KeyCode::Char('c') if self.select_mode && !self.selected_rows.is_empty() => {
                let modal = BatchModal::new(
                    self.id,
                    BatchKind::Cancel,
                    self.namespace.clone(),
                    self.batch_items(),
                );
                vec![Action::Push(Box::new(Screen::Batch(modal)))]
            }
            KeyCode::Char('X') if self.select_mode && !self.selected_rows.is_empty() => {
                let modal = BatchModal::new(
                    self.id,
                    BatchKind::Terminate,
                    self.namespace.clone(),
                    self.batch_items(),
                );
                vec![Action::Push(Box::new(Screen::Batch(modal)))]
            }
            KeyCode::Char('d') => {
                let seed = self.selected().cloned();
                vec![Action::Push(Box::new(Screen::WorkflowDiff(
                    WorkflowDiff::new(&self.namespace, seed),
                )))]
            }
            KeyCode::Char('t') => vec![Action::Push(Box::new(Screen::TaskQueues(
                TaskQueues::new(&self.namespace),
            )))],
            KeyCode::Char('s') => vec![Action::Push(Box::new(Screen::ScheduleList(
                ScheduleList::new(&self.namespace),
            )))],
            KeyCode::Char('y') => {
                self.copy_selected_id(ctx);
                Vec::new()
            }
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
            ScreenMsg::WorkflowsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(workflows) => {
                        self.error = None;
                        // Refresh preserves the selection by position; the
                        // dataset changed, so the multi-selection is void.
                        let position = self.selection;
                        self.all_workflows = workflows;
                        self.visible = self
                            .all_workflows
                            .iter()
                            .filter(|w| matches_filter(w, &self.filter_text))
                            .cloned()
                            .collect();
                        self.selected_rows.clear();
                        self.selection = if position < self.visible.len() { position } else { 0 };
                        vec![Action::SetStats(self.stats())]
                    }
                    Err(err) => {
                        self.error = Some(err.to_string());
                        Vec::new()
                    }
                }
            }
            ScreenMsg::QueryComposed(query) => self.set_query(query, ctx),
            ScreenMsg::DateRangePicked(clause) => {
                self.visibility_query = match clause {
                    Some(clause) => combine_date_clause(&self.visibility_query, &clause),
                    None => clear_date_clauses(&self.visibility_query),
                };
                self.filter_text.clear();
                self.load_data(ctx);
                Vec::new()
            }
            ScreenMsg::BatchCompleted => {
                self.selected_rows.clear();
                self.load_data(ctx);
                Vec::new()
            }
            ScreenMsg::FlashExpired => {
                self.flash = None;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        if self.select_mode {
            let mut hints = vec![
                KeyHint::new("space", "Select"),
                KeyHint::new("ctrl+a", "Select All"),
                KeyHint::new("v", "Exit Select"),
            ];
            if !self.selected_rows.is_empty() {
                hints.push(KeyHint::new("c", "Cancel"));
                hints.push(KeyHint::new("X", "Terminate"));
            }
            hints.push(KeyHint::new("esc", "Back"));
            return hints;
        }

        let mut hints = vec![
            KeyHint::new("enter", "Detail"),
            KeyHint::new("/", "Filter"),
            KeyHint::new("F", "Query"),
            KeyHint::new("f", "Templates"),
            KeyHint::new("D", "Date Range"),
        ];
        if !self.visibility_query.is_empty() {
            hints.push(KeyHint::new("C", "Clear Query"));
            hints.push(KeyHint::new("S", "Save Filter"));
        }
        hints.extend([
            KeyHint::new("L", "Load Filter"),
            KeyHint::new("d", "Diff"),
            KeyHint::new("v", "Select Mode"),
            KeyHint::new("y", "Copy ID"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("a", "Auto-refresh"),
            KeyHint::new("t", "Task Queues"),
            KeyHint::new("s", "Schedules"),
            KeyHint::new("esc", "Back"),
        ]);
        hints
    }

    fn panel_title(&self) -> String {
        if self.select_mode {
            return format!("Workflows (Select Mode, {} marked)", self.selected_rows.len());
        }
        if !self.visibility_query.is_empty() {
            return format!("Workflows ({})", truncate(&self.visibility_query, 40));
        }
        if !self.filter_text.is_empty() {
            return format!("Workflows (/{})", self.filter_text);
        }
        if self.loading {
            return "Workflows (loading…)".to_string();
        }
        "Workflows".to_string()
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let content = if self.filter_active {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(area);
            self.draw_filter_bar(f, chunks[0]);
            chunks[1]
        } else {
            area
        };

        if self.show_preview {
            let (left, right) = two_column(content, 60);
            self.draw_table(f, left);
            self.draw_preview(f, right);
        } else {
            self.draw_table(f, content);
        }
    }

    fn draw_filter_bar(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let line = Line::from(vec![
            Span::styled("› /", Style::default().fg(t.accent)),
            Span::styled(self.filter_text.clone(), Style::default().fg(t.text)),
            Span::styled("▏", Style::default().fg(t.accent)),
        ]);
        let block = Block::default()
            .title(" Filter ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border_focus));
        f.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_table(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let block = Block::default()
            .title(self.panel_title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border_focus));

        if let Some(error) = &self.error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("✗ Error loading workflows: {error}"),
                    Style::default().fg(t.failed),
                ))
                .block(block)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        if self.visible.is_empty() {
            let message = if self.all_workflows.is_empty() {
                "no workflows in this namespace"
            } else {
                "no workflows match the filter"
            };
            f.render_widget(
                Paragraph::new(Span::styled(message, Style::default().fg(t.text_dim)))
                    .block(block),
                area,
            );
            return;
        }

        let now = Utc::now();
        let rows: Vec<Row> = self
            .visible
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let marker = if self.select_mode {
                    if self.selected_rows.contains(&i) { "▣ " } else { "▢ " }
                } else {
                    ""
                };
                let color = status_color(w.status, &t);
                Row::new(vec![
                    Span::styled(
                        format!("{marker}{}", truncate(&w.id, 28)),
                        Style::default().fg(t.text),
                    ),
                    Span::styled(
                        truncate(&w.workflow_type, 18),
                        Style::default().fg(t.text_dim),
                    ),
                    Span::styled(
                        format!("{} {}", status_icon(w.status), w.status),
                        Style::default().fg(color),
                    ),
                    Span::styled(
                        format_relative_time(now, w.start_time),
                        Style::default().fg(t.text_dim),
                    ),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(38),
                Constraint::Percentage(24),
                Constraint::Percentage(20),
                Constraint::Percentage(18),
            ],
        )
        .header(
            Row::new(vec!["WORKFLOW ID", "TYPE", "STATUS", "START TIME"])
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

        if let Some(flash) = &self.flash {
            let lines: Vec<Line> = flash
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(t.completed))))
                .collect();
            f.render_widget(Paragraph::new(lines).block(block), area);
            return;
        }

        if self.select_mode && !self.selected_rows.is_empty() {
            self.draw_selection_summary(f, area, block);
            return;
        }

        let Some(w) = self.selected() else {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let now = Utc::now();
        let color = status_color(w.status, &t);
        let duration = match (w.end_time, w.status) {
            (Some(end), _) => weft_core::format_duration(end - w.start_time),
            (None, WorkflowStatus::Running) => weft_core::format_duration(now - w.start_time),
            _ => "-".to_string(),
        };
        let ended = w
            .end_time
            .map(|end| format_relative_time(now, end))
            .unwrap_or_else(|| "-".to_string());

        let mut lines = vec![
            Line::from(Span::styled(
                "Workflow",
                Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(truncate(&w.id, 40), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Status", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!("{} {}", status_icon(w.status), w.status),
                Style::default().fg(color),
            )),
            Line::default(),
            Line::from(Span::styled("Type", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(w.workflow_type.clone(), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Started", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format_relative_time(now, w.start_time),
                Style::default().fg(t.text),
            )),
            Line::default(),
            Line::from(Span::styled("Ended", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(ended, Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Duration", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(duration, Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Task Queue", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(w.task_queue.clone(), Style::default().fg(t.text))),
            Line::default(),
            Line::from(Span::styled("Run ID", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                truncate(&w.run_id, 36),
                Style::default().fg(t.text_dim),
            )),
        ];
        if !w.memo.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Memo", Style::default().fg(t.text_dim))));
            for (key, value) in &w.memo {
                lines.push(Line::from(Span::styled(
                    format!("{key}: {value}"),
                    Style::default().fg(t.text),
                )));
            }
        }
        f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }

    fn draw_selection_summary(&self, f: &mut Frame<'_>, area: Rect, block: Block<'_>) {
        let t = theme();
        let mut running = 0;
        let mut completed = 0;
        let mut failed = 0;
        for &idx in &self.selected_rows {
            if let Some(w) = self.visible.get(idx) {
                match w.status {
                    WorkflowStatus::Running => running += 1,
                    WorkflowStatus::Completed => completed += 1,
                    WorkflowStatus::Failed => failed += 1,
                    _ => {}
                }
            }
        }
        let lines = vec![
            Line::from(Span::styled(
                "Selected Workflows",
                Style::default().fg(t.text_dim).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} workflow(s)", self.selected_rows.len()),
                Style::default().fg(t.accent),
            )),
            Line::default(),
            Line::from(Span::styled("Status Breakdown", Style::default().fg(t.text_dim))),
            Line::from(Span::styled(
                format!("● Running: {running}"),
                Style::default().fg(t.running),
            )),
            Line::from(Span::styled(
                format!("✓ Completed: {completed}"),
                Style::default().fg(t.completed),
            )),
            Line::from(Span::styled(
                format!("✗ Failed: {failed}"),
                Style::default().fg(t.failed),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Press 'c' to cancel or 'X' to terminate the selection",
                Style::default().fg(t.text_dim),
            )),
        ];
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
