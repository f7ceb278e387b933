//! Screen kernel: the sum type of all screens and modals, plus the
//! actions they hand back to the shell.
//!
//! Screens never mutate each other. Key and message handlers return
//! [`Action`]s; the shell applies them, which keeps navigation and
//! cross-screen effects on the rendering loop in a single place.

use crate::events::{Ctx, ScreenId, ScreenMsg};
use crate::modals::batch::BatchModal;
use crate::modals::confirm::ConfirmModal;
use crate::modals::date_range::DateRangeModal;
use crate::modals::help::HelpModal;
use crate::modals::input::InputModal;
use crate::modals::query_result::QueryResultModal;
use crate::modals::reset::{QuickResetModal, ResetPickerModal};
use crate::modals::saved_filters::FilterPickerModal;
use crate::modals::templates::TemplatePickerModal;
use crate::modals::theme_select::ThemeSelectModal;
use crate::modals::visibility::VisibilityInputModal;
use crate::nav::StackScreen;
use crate::screens::event_history::EventHistory;
use crate::screens::namespace_detail::NamespaceInfo;
use crate::screens::namespace_list::NamespaceList;
use crate::screens::schedule_list::ScheduleList;
use crate::screens::task_queue::TaskQueues;
use crate::screens::workflow_detail::WorkflowDetail;
use crate::screens::workflow_diff::WorkflowDiff;
use crate::screens::workflow_list::WorkflowList;
use crate::widgets::WorkflowStats;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;
use weft_core::SavedFilter;

/// A keybinding hint shown in the menu bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHint {
    pub key: &'static str,
    pub description: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, description: &'static str) -> Self {
        Self { key, description }
    }
}

/// Effects a screen asks the shell to perform.
pub enum Action {
    Push(Box<Screen>),
    Pop,
    Quit,
    /// Deliver a message to another screen (usually the modal's parent).
    ToScreen(ScreenId, ScreenMsg),
    SetNamespace(String),
    SetStats(WorkflowStats),
    SetQueueCount(usize),
    /// Persist a filter into the config store and flush to disk.
    SaveFilter(SavedFilter),
    DeleteFilter(String),
    SetDefaultFilter(String),
    /// The theme registry already swapped; persist the choice.
    PersistTheme(String),
}

/// Sum type over every screen and modal. Modals are screens with a
/// result callback expressed as a [`ScreenMsg`] to their parent.
pub enum Screen {
    NamespaceList(NamespaceList),
    WorkflowList(WorkflowList),
    WorkflowDetail(WorkflowDetail),
    EventHistory(EventHistory),
    TaskQueues(TaskQueues),
    ScheduleList(ScheduleList),
    NamespaceInfo(NamespaceInfo),
    WorkflowDiff(WorkflowDiff),

    Confirm(ConfirmModal),
    Batch(BatchModal),
    Input(InputModal),
    QuickReset(QuickResetModal),
    ResetPicker(ResetPickerModal),
    ThemeSelect(ThemeSelectModal),
    FilterPicker(FilterPickerModal),
    TemplatePicker(TemplatePickerModal),
    DateRange(DateRangeModal),
    QueryResult(QueryResultModal),
    VisibilityInput(VisibilityInputModal),
    Help(HelpModal),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Screen::NamespaceList($inner) => $body,
            Screen::WorkflowList($inner) => $body,
            Screen::WorkflowDetail($inner) => $body,
            Screen::EventHistory($inner) => $body,
            Screen::TaskQueues($inner) => $body,
            Screen::ScheduleList($inner) => $body,
            Screen::NamespaceInfo($inner) => $body,
            Screen::WorkflowDiff($inner) => $body,
            Screen::Confirm($inner) => $body,
            Screen::Batch($inner) => $body,
            Screen::Input($inner) => $body,
            Screen::QuickReset($inner) => $body,
            Screen::ResetPicker($inner) => $body,
            Screen::ThemeSelect($inner) => $body,
            Screen::FilterPicker($inner) => $body,
            Screen::TemplatePicker($inner) => $body,
            Screen::DateRange($inner) => $body,
            Screen::QueryResult($inner) => $body,
            Screen::VisibilityInput($inner) => $body,
            Screen::Help($inner) => $body,
        }
    };
}

impl Screen {
    pub fn on_key(&mut self, key: KeyEvent, ctx: &Ctx) -> Vec<Action> {
        dispatch!(self, s => s.on_key(key, ctx))
    }

    pub fn on_msg(&mut self, msg: ScreenMsg, ctx: &Ctx) -> Vec<Action> {
        dispatch!(self, s => s.on_msg(msg, ctx))
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        dispatch!(self, s => s.draw(f, area))
    }

    pub fn hints(&self) -> Vec<KeyHint> {
        dispatch!(self, s => s.hints())
    }

    /// While true, the shell delegates every key to this screen: text
    /// inputs own their keystrokes and busy modals must not be popped
    /// out from under an in-flight mutation.
    pub fn captures_input(&self) -> bool {
        dispatch!(self, s => s.captures_input())
    }
}

impl StackScreen for Screen {
    fn id(&self) -> ScreenId {
        dispatch!(self, s => s.id())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, s => s.name())
    }

    fn start(&mut self, ctx: &Ctx) {
        dispatch!(self, s => s.start(ctx))
    }

    fn stop(&mut self) {
        dispatch!(self, s => s.stop())
    }

    fn is_modal(&self) -> bool {
        matches!(
            self,
            Screen::Confirm(_)
                | Screen::Batch(_)
                | Screen::Input(_)
                | Screen::QuickReset(_)
                | Screen::ResetPicker(_)
                | Screen::ThemeSelect(_)
                | Screen::FilterPicker(_)
                | Screen::TemplatePicker(_)
                | Screen::DateRange(_)
                | Screen::QueryResult(_)
                | Screen::VisibilityInput(_)
                | Screen::Help(_)
        )
    }
}
