//! The Provider port: everything the client needs from the service.

use crate::ProviderResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use weft_core::{
    BatchResult, EnhancedHistoryEvent, Namespace, NamespaceCreateRequest, NamespaceDetail,
    NamespaceUpdateRequest, Poller, QueryOutcome, ResetPoint, Schedule, TaskQueueInfo, Workflow,
    WorkflowIdentifier,
};

/// Options for list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: usize,
    pub page_token: String,
    /// Server-side visibility expression, e.g. `WorkflowType='OrderWorkflow'`.
    pub query: String,
}

impl ListOptions {
    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size, ..Default::default() }
    }
}

/// TLS material locations for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub cert_path: String,
    #[serde(default)]
    pub key_path: String,
    #[serde(default)]
    pub ca_path: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub skip_verify: bool,
}

impl TlsConfig {
    pub fn is_configured(&self) -> bool {
        !self.cert_path.is_empty() || !self.ca_path.is_empty() || self.skip_verify
    }
}

/// Server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub address: String,
    pub namespace: String,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: "localhost:7233".to_string(),
            namespace: "default".to_string(),
            tls: TlsConfig::default(),
        }
    }
}

/// Abstract contract to the orchestration service.
///
/// All operations are safe to call from any task. Deadlines are imposed by
/// callers (`tokio::time::timeout` around the future); a backend maps its
/// own timeout errors onto [`crate::ProviderError::Connection`]. Batch
/// mutations are not transactional: partial success is reported per item.
#[async_trait]
pub trait Provider: Send + Sync {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All namespaces visible to the client; paginates internally.
    async fn list_namespaces(&self) -> ProviderResult<Vec<Namespace>>;

    /// One page of workflows plus the next page token (empty when done).
    async fn list_workflows(
        &self,
        namespace: &str,
        opts: ListOptions,
    ) -> ProviderResult<(Vec<Workflow>, String)>;

    async fn get_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Workflow>;

    /// Full event history for a run; paginates internally.
    async fn get_workflow_history(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<EnhancedHistoryEvent>>;

    /// Combined workflow + activity poller sets for a queue name.
    async fn describe_task_queue(
        &self,
        namespace: &str,
        name: &str,
    ) -> ProviderResult<(TaskQueueInfo, Vec<Poller>)>;

    async fn list_schedules(
        &self,
        namespace: &str,
        opts: ListOptions,
    ) -> ProviderResult<(Vec<Schedule>, String)>;

    async fn describe_namespace(&self, namespace: &str) -> ProviderResult<NamespaceDetail>;

    async fn get_reset_points(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<ResetPoint>>;

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    async fn cancel_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        reason: &str,
    ) -> ProviderResult<()>;

    async fn terminate_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        reason: &str,
    ) -> ProviderResult<()>;

    async fn signal_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        signal_name: &str,
        input: Option<serde_json::Value>,
    ) -> ProviderResult<()>;

    async fn delete_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<()>;

    /// Resets a run to `event_id`; returns the new run id.
    async fn reset_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        event_id: i64,
        reason: &str,
    ) -> ProviderResult<String>;

    /// Executes a server-defined query handler. A handler-level failure is
    /// reported inside [`QueryOutcome::error`]; transport failures are
    /// ordinary errors.
    async fn query_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        query_type: &str,
        args: Option<serde_json::Value>,
    ) -> ProviderResult<QueryOutcome>;

    async fn cancel_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>>;

    async fn terminate_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>>;

    async fn pause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        note: &str,
    ) -> ProviderResult<()>;

    async fn unpause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        note: &str,
    ) -> ProviderResult<()>;

    async fn trigger_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()>;

    async fn delete_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()>;

    async fn create_namespace(&self, req: NamespaceCreateRequest) -> ProviderResult<()>;

    async fn update_namespace(&self, req: NamespaceUpdateRequest) -> ProviderResult<()>;

    async fn deprecate_namespace(&self, name: &str) -> ProviderResult<()>;

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    /// Cached connectivity status; no I/O.
    fn is_connected(&self) -> bool;

    /// Lightweight liveness probe. A failed probe atomically flips the
    /// cached status to disconnected.
    async fn check_connection(&self) -> ProviderResult<()>;

    /// Tears down the transport and redials.
    async fn reconnect(&self) -> ProviderResult<()>;

    fn config(&self) -> ConnectionConfig;
}
