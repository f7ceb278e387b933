//! Entity value records and status enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp alias used across the workspace.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// NAMESPACES
// ============================================================================

/// Lifecycle state of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamespaceState {
    Active,
    Deprecated,
    Deleted,
    Unknown,
}

impl fmt::Display for NamespaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NamespaceState::Active => "Active",
            NamespaceState::Deprecated => "Deprecated",
            NamespaceState::Deleted => "Deleted",
            NamespaceState::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl NamespaceState {
    /// Maps a wire-level state string onto the display enum.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "registered" => NamespaceState::Active,
            "deprecated" => NamespaceState::Deprecated,
            "deleted" => NamespaceState::Deleted,
            _ => NamespaceState::Unknown,
        }
    }
}

/// A namespace visible to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub state: NamespaceState,
    /// Human-readable retention period, e.g. "7 days".
    pub retention: String,
    pub description: String,
    pub owner_email: String,
}

/// Extended namespace information returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDetail {
    pub namespace: Namespace,
    pub id: String,
    pub is_global: bool,
    pub history_archival: String,
    pub visibility_archival: String,
    pub failover_version: i64,
    pub clusters: Vec<String>,
    pub data: BTreeMap<String, String>,
}

/// Parameters for registering a new namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceCreateRequest {
    pub name: String,
    pub description: String,
    pub owner_email: String,
    pub retention_days: u32,
}

/// Parameters for updating an existing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceUpdateRequest {
    pub name: String,
    pub description: String,
    pub owner_email: String,
    pub retention_days: u32,
}

// ============================================================================
// WORKFLOWS
// ============================================================================

/// Execution status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Canceled,
    Terminated,
    TimedOut,
    Unknown,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Completed => "Completed",
            WorkflowStatus::Failed => "Failed",
            WorkflowStatus::Canceled => "Canceled",
            WorkflowStatus::Terminated => "Terminated",
            WorkflowStatus::TimedOut => "TimedOut",
            WorkflowStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl WorkflowStatus {
    /// Maps a wire-level status string onto the display enum.
    /// ContinuedAsNew renders as Completed.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => WorkflowStatus::Running,
            "completed" | "continuedasnew" | "continued_as_new" => WorkflowStatus::Completed,
            "failed" => WorkflowStatus::Failed,
            "canceled" | "cancelled" => WorkflowStatus::Canceled,
            "terminated" => WorkflowStatus::Terminated,
            "timedout" | "timed_out" => WorkflowStatus::TimedOut,
            _ => WorkflowStatus::Unknown,
        }
    }

    /// A run is closed once it has reached any terminal status.
    pub fn is_closed(&self) -> bool {
        !matches!(self, WorkflowStatus::Running | WorkflowStatus::Unknown)
    }
}

/// A workflow execution, uniquely identified by `(id, run_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub run_id: String,
    pub workflow_type: String,
    pub status: WorkflowStatus,
    pub namespace: String,
    pub task_queue: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub parent_id: Option<String>,
    pub memo: BTreeMap<String, String>,
}

/// `(workflow_id, run_id)` pair used by batch operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowIdentifier {
    pub workflow_id: String,
    pub run_id: String,
}

/// Per-item outcome of a batch mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub workflow_id: String,
    pub run_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of a workflow query. The server may return a structured query
/// error distinct from a transport failure; it lands in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub result: String,
    pub error: Option<String>,
}

/// A history event id a run may be reset to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPoint {
    pub event_id: i64,
    pub event_type: String,
    pub timestamp: Timestamp,
    pub description: String,
    pub reason: String,
}

/// Event types that mark the first failure in a run, used by the quick
/// reset flow.
pub const FAILURE_EVENT_TYPES: &[&str] = &[
    "ActivityTaskFailed",
    "WorkflowExecutionFailed",
    "WorkflowTaskFailed",
    "WorkflowExecutionTimedOut",
];

impl ResetPoint {
    pub fn is_failure_point(&self) -> bool {
        FAILURE_EVENT_TYPES.contains(&self.event_type.as_str())
    }
}

// ============================================================================
// TASK QUEUES
// ============================================================================

/// Which class of tasks a queue (or poller) serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskQueueType {
    Workflow,
    Activity,
    Combined,
}

impl fmt::Display for TaskQueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskQueueType::Workflow => "Workflow",
            TaskQueueType::Activity => "Activity",
            TaskQueueType::Combined => "Combined",
        };
        f.write_str(s)
    }
}

/// Task queue status information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQueueInfo {
    pub name: String,
    pub queue_type: TaskQueueType,
    pub poller_count: usize,
    pub backlog: u64,
}

/// A worker identity currently polling a task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poller {
    pub identity: String,
    pub last_access: Timestamp,
    pub queue_type: TaskQueueType,
    pub rate_per_second: f64,
}

// ============================================================================
// SCHEDULES
// ============================================================================

/// A named recurrence rule that materializes workflows on a cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub workflow_type: String,
    /// Recurrence spec, e.g. a cron line.
    pub spec: String,
    pub paused: bool,
    pub next_run: Option<Timestamp>,
    pub last_run: Option<Timestamp>,
    pub total_actions: u64,
    pub notes: String,
}

// ============================================================================
// FILTERS
// ============================================================================

/// A named visibility expression persisted in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_status_wire_mapping() {
        assert_eq!(WorkflowStatus::from_wire("Running"), WorkflowStatus::Running);
        assert_eq!(WorkflowStatus::from_wire("TIMED_OUT"), WorkflowStatus::TimedOut);
        assert_eq!(
            WorkflowStatus::from_wire("ContinuedAsNew"),
            WorkflowStatus::Completed
        );
        assert_eq!(WorkflowStatus::from_wire("bogus"), WorkflowStatus::Unknown);
    }

    #[test]
    fn closed_statuses() {
        assert!(!WorkflowStatus::Running.is_closed());
        assert!(!WorkflowStatus::Unknown.is_closed());
        for s in [
            WorkflowStatus::Completed,
            WorkflowStatus::Failed,
            WorkflowStatus::Canceled,
            WorkflowStatus::Terminated,
            WorkflowStatus::TimedOut,
        ] {
            assert!(s.is_closed(), "{s} should be closed");
        }
    }

    #[test]
    fn namespace_state_wire_mapping() {
        assert_eq!(NamespaceState::from_wire("registered"), NamespaceState::Active);
        assert_eq!(
            NamespaceState::from_wire("Deprecated"),
            NamespaceState::Deprecated
        );
        assert_eq!(NamespaceState::from_wire("???"), NamespaceState::Unknown);
    }

    #[test]
    fn saved_filter_round_trips() {
        let filter = SavedFilter {
            name: "failures".to_string(),
            query: "ExecutionStatus='Failed'".to_string(),
            is_default: true,
        };
        let json = serde_json::to_string(&filter).unwrap();
        let back: SavedFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(filter, back);
    }

    #[test]
    fn reset_point_failure_detection() {
        let point = ResetPoint {
            event_id: 7,
            event_type: "ActivityTaskFailed".to_string(),
            timestamp: Utc::now(),
            description: "activity failed".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(point.is_failure_point());

        let benign = ResetPoint {
            event_type: "WorkflowTaskCompleted".to_string(),
            ..point
        };
        assert!(!benign.is_failure_point());
    }
}
