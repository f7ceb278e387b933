//! Root application controller: owns the view stack, global keybindings,
//! chrome state (stats bar, breadcrumbs, hints) and action application.

use crate::config::TuiConfig;
use crate::events::{ConnectionStatus, Ctx, ScreenId, ScreenMsg, TuiEvent};
use crate::modals::help::HelpModal;
use crate::modals::theme_select::ThemeSelectModal;
use crate::nav::{StackScreen, ViewStack};
use crate::screen::{Action, Screen};
use crate::screens::namespace_list::NamespaceList;
use crate::widgets::{Crumbs, MenuBar, StatsBar, WorkflowStats};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;
use std::path::PathBuf;

pub struct App {
    pub ctx: Ctx,
    stack: ViewStack<Screen>,
    status: ConnectionStatus,
    namespace: String,
    stats: WorkflowStats,
    should_quit: bool,
    config_path: PathBuf,
}

impl App {
    pub fn new(ctx: Ctx, config_path: PathBuf, namespace: &str) -> Self {
        let mut app = Self {
            ctx,
            stack: ViewStack::new(),
            status: ConnectionStatus::Connected,
            namespace: namespace.to_string(),
            stats: WorkflowStats::default(),
            should_quit: false,
            config_path,
        };
        let root = Screen::NamespaceList(NamespaceList::new());
        let ctx = app.ctx.clone();
        app.stack.push(root, &ctx);
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn stats(&self) -> WorkflowStats {
        self.stats
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn stack(&self) -> &ViewStack<Screen> {
        &self.stack
    }

    pub fn current_screen(&self) -> Option<&Screen> {
        self.stack.current()
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Input(key) => self.handle_key(key),
            TuiEvent::Screen(id, msg) => self.route(id, msg),
            TuiEvent::Connection(status) => self.status = status,
            TuiEvent::Tick | TuiEvent::Resize { .. } => {}
        }
    }

    /// Delivers a message to the addressed screen. A message for a screen
    /// that has been popped finds no target and is dropped.
    fn route(&mut self, id: ScreenId, msg: ScreenMsg) {
        let ctx = self.ctx.clone();
        let actions = match self.stack.find_mut(id) {
            Some(screen) => screen.on_msg(msg, &ctx),
            None => Vec::new(),
        };
        self.apply(actions);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Text inputs and busy modals own every keystroke.
        if self.stack.current().map(Screen::captures_input).unwrap_or(false) {
            self.delegate(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') if self.stack.depth() <= 1 => {
                self.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                // Delegate first: modals translate Esc into their own
                // teardown actions; plain screens fall back to pop.
                if self.stack.current().map(|s| s.is_modal()).unwrap_or(false) {
                    self.delegate(key);
                } else {
                    self.stack.pop();
                }
            }
            KeyCode::Char('?') => {
                if self.stack.current().map(|s| s.name()) == Some("help") {
                    self.stack.pop();
                } else {
                    let ctx = self.ctx.clone();
                    self.stack.push(Screen::Help(HelpModal::new()), &ctx);
                }
            }
            KeyCode::Char('T') => {
                if self.stack.current().map(|s| s.name()) == Some("theme-selector") {
                    self.stack.pop();
                } else {
                    let ctx = self.ctx.clone();
                    self.stack.push(Screen::ThemeSelect(ThemeSelectModal::new()), &ctx);
                }
            }
            _ => self.delegate(key),
        }
    }

    fn delegate(&mut self, key: KeyEvent) {
        let ctx = self.ctx.clone();
        let actions = match self.stack.current_mut() {
            Some(screen) => screen.on_key(key, &ctx),
            None => Vec::new(),
        };
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Push(screen) => {
                    let ctx = self.ctx.clone();
                    self.stack.push(*screen, &ctx);
                }
                Action::Pop => {
                    self.stack.pop();
                }
                Action::Quit => self.should_quit = true,
                Action::ToScreen(id, msg) => self.route(id, msg),
                Action::SetNamespace(namespace) => {
                    self.ctx
                        .with_config(|c| c.last_namespace = Some(namespace.clone()));
                    self.namespace = namespace;
                }
                Action::SetStats(stats) => {
                    self.stats.running = stats.running;
                    self.stats.completed = stats.completed;
                    self.stats.failed = stats.failed;
                }
                Action::SetQueueCount(count) => self.stats.queues = count,
                Action::SaveFilter(filter) => {
                    self.ctx.with_config(|c| c.save_filter(filter));
                    self.save_config();
                }
                Action::DeleteFilter(name) => {
                    self.ctx.with_config(|c| c.delete_filter(&name));
                    self.save_config();
                }
                Action::SetDefaultFilter(name) => {
                    self.ctx.with_config(|c| c.set_default_filter(&name));
                    self.save_config();
                }
                Action::PersistTheme(name) => {
                    self.ctx.with_config(|c| c.theme = name);
                    self.save_config();
                }
            }
        }
    }

    pub fn save_config(&self) {
        let snapshot: TuiConfig = self.ctx.with_config(|c| c.clone());
        if let Err(err) = snapshot.save(&self.config_path) {
            tracing::warn!(error = %err, "failed to save config");
        }
    }

    fn crumbs(&self) -> Vec<String> {
        let base = match self.stack.screens().get(self.stack.base_index()) {
            Some(screen) => screen.name(),
            None => return Vec::new(),
        };
        let ns = self.namespace.clone();
        match base {
            "namespaces" => vec!["Namespaces".to_string()],
            "workflows" => vec!["Namespaces".to_string(), ns, "Workflows".to_string()],
            "workflow-detail" => vec![
                "Namespaces".to_string(),
                ns,
                "Workflows".to_string(),
                "Detail".to_string(),
            ],
            "events" => vec![
                "Namespaces".to_string(),
                ns,
                "Workflows".to_string(),
                "Detail".to_string(),
                "Events".to_string(),
            ],
            "task-queues" => vec!["Namespaces".to_string(), ns, "Task Queues".to_string()],
            "schedules" => vec!["Namespaces".to_string(), ns, "Schedules".to_string()],
            "namespace-detail" => vec!["Namespaces".to_string(), ns, "Detail".to_string()],
            "workflow-diff" => vec!["Namespaces".to_string(), ns, "Diff".to_string()],
            other => vec![other.to_string()],
        }
    }

    pub fn draw(&self, f: &mut Frame<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.size());

        StatsBar {
            namespace: &self.namespace,
            status: self.status,
            stats: self.stats,
        }
        .render(f, rows[0]);

        let crumbs = self.crumbs();
        Crumbs { path: &crumbs }.render(f, rows[1]);

        // Backdrop plus any modal overlays above it, bottom-up.
        let screens = self.stack.screens();
        let base = self.stack.base_index();
        if let Some(screen) = screens.get(base) {
            screen.draw(f, rows[2]);
        }
        for screen in &screens[base + 1..] {
            screen.draw(f, rows[2]);
        }

        let hints = self
            .stack
            .current()
            .map(Screen::hints)
            .unwrap_or_default();
        MenuBar { hints: &hints }.render(f, rows[3]);
    }
}
