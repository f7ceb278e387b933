//! Event types for the TUI event loop and the draw-queue primitive.
//!
//! Every mutation of UI-visible state happens on the rendering loop, which
//! drains a single channel of [`TuiEvent`]s. Async work never touches
//! screen state directly: a task completes by posting a typed
//! [`ScreenMsg`] addressed to a [`ScreenId`]. Messages execute in
//! submission order; a message for a screen that has been popped finds no
//! target and is a no-op.

use crate::config::TuiConfig;
use crossterm::event::KeyEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use weft_core::{
    BatchResult, EnhancedHistoryEvent, Namespace, NamespaceDetail, Poller, QueryOutcome,
    ResetPoint, Schedule, TaskQueueInfo, Workflow,
};
use weft_provider::{Provider, ProviderError};

/// Identity of a screen instance on the stack.
pub type ScreenId = u64;

pub fn next_screen_id() -> ScreenId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Connection status shown in the stats bar. Transitions happen only on
/// the rendering loop, posted by the connection supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

#[derive(Debug)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Periodic wall-clock tick; redraws relative timestamps.
    Tick,
    Screen(ScreenId, ScreenMsg),
    Connection(ConnectionStatus),
}

/// Kind tag for mutation completions, used by screens to pick the
/// follow-up (refresh, pop, error display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Cancel,
    Terminate,
    Signal,
    Delete,
    CreateNamespace,
    UpdateNamespace,
    DeprecateNamespace,
    PauseSchedule,
    UnpauseSchedule,
    TriggerSchedule,
    DeleteSchedule,
}

impl MutationKind {
    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::Cancel => "cancel",
            MutationKind::Terminate => "terminate",
            MutationKind::Signal => "signal",
            MutationKind::Delete => "delete",
            MutationKind::CreateNamespace => "create namespace",
            MutationKind::UpdateNamespace => "update namespace",
            MutationKind::DeprecateNamespace => "deprecate namespace",
            MutationKind::PauseSchedule => "pause schedule",
            MutationKind::UnpauseSchedule => "unpause schedule",
            MutationKind::TriggerSchedule => "trigger schedule",
            MutationKind::DeleteSchedule => "delete schedule",
        }
    }
}

/// Typed completion messages posted back to screens.
#[derive(Debug)]
pub enum ScreenMsg {
    /// Auto-refresh tick: the handler dispatches a fetch, never awaits.
    RefreshTick,

    NamespacesLoaded(Result<Vec<Namespace>, ProviderError>),
    WorkflowsLoaded(Result<Vec<Workflow>, ProviderError>),
    WorkflowLoaded(Result<Workflow, ProviderError>),
    HistoryLoaded(Result<Vec<EnhancedHistoryEvent>, ProviderError>),
    SchedulesLoaded(Result<Vec<Schedule>, ProviderError>),
    NamespaceDescribed(Result<NamespaceDetail, ProviderError>),
    QueuesDiscovered(Result<Vec<String>, ProviderError>),
    QueueDescribed {
        name: String,
        result: Result<(TaskQueueInfo, Vec<Poller>), ProviderError>,
    },
    ResetPointsLoaded(Result<Vec<ResetPoint>, ProviderError>),
    DiffSideLoaded {
        left: bool,
        result: Result<(Workflow, Vec<EnhancedHistoryEvent>), ProviderError>,
    },

    MutationDone {
        kind: MutationKind,
        result: Result<(), ProviderError>,
    },
    ResetDone(Result<String, ProviderError>),
    QueryDone {
        query_type: String,
        result: Result<QueryOutcome, ProviderError>,
    },
    BatchItemSettled {
        index: usize,
        result: BatchResult,
    },
    BatchFinished(Result<(), ProviderError>),
    /// Posted to the invoking screen after the batch modal closes.
    BatchCompleted,

    /// A modal composed a visibility expression for its parent list.
    QueryComposed(String),
    /// A date-range modal picked a clause (`None` clears date parts).
    DateRangePicked(Option<String>),
    /// A diff input modal collected one side's identifiers.
    DiffRequested {
        left: bool,
        workflow_id: String,
        run_id: String,
    },

    /// The clipboard-copy flash is over; restore the preview.
    FlashExpired,
}

/// Cloneable sender half of the draw queue.
#[derive(Clone)]
pub struct UiSender {
    tx: mpsc::UnboundedSender<TuiEvent>,
}

impl UiSender {
    pub fn new(tx: mpsc::UnboundedSender<TuiEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: TuiEvent) {
        let _ = self.tx.send(event);
    }

    pub fn screen(&self, id: ScreenId, msg: ScreenMsg) {
        let _ = self.tx.send(TuiEvent::Screen(id, msg));
    }

    pub fn connection(&self, status: ConnectionStatus) {
        let _ = self.tx.send(TuiEvent::Connection(status));
    }
}

/// Shared handles screens need to do their work: the provider, the draw
/// queue, and the config store. Cheap to clone; namespaces and ids travel
/// by value between screens.
#[derive(Clone)]
pub struct Ctx {
    pub provider: Arc<dyn Provider>,
    pub tx: UiSender,
    pub config: Arc<Mutex<TuiConfig>>,
}

impl Ctx {
    pub fn new(provider: Arc<dyn Provider>, tx: UiSender, config: TuiConfig) -> Self {
        Self {
            provider,
            tx,
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// Runs `f` over the config store. The lock is never held across an
    /// await point.
    pub fn with_config<R>(&self, f: impl FnOnce(&mut TuiConfig) -> R) -> R {
        let mut guard = self.config.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
