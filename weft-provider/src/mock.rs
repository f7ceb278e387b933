//! In-memory provider used by tests and offline demos.
//!
//! Mutations are honoured against the in-memory state with the same
//! state-gating the real service applies (no signalling a terminated
//! workflow, per-item batch outcomes), so the interaction engine can be
//! exercised end to end without a server.

use crate::{ConnectionConfig, ListOptions, Provider, ProviderError, ProviderResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use weft_core::{
    BatchResult, EnhancedHistoryEvent, Namespace, NamespaceCreateRequest, NamespaceDetail,
    NamespaceState, NamespaceUpdateRequest, Poller, QueryOutcome, ResetPoint, Schedule,
    TaskQueueInfo, TaskQueueType, Workflow, WorkflowIdentifier, WorkflowStatus,
    FAILURE_EVENT_TYPES,
};

#[derive(Default)]
struct MockState {
    namespaces: Vec<Namespace>,
    workflows: HashMap<String, Vec<Workflow>>,
    histories: HashMap<(String, String, String), Vec<EnhancedHistoryEvent>>,
    schedules: HashMap<String, Vec<Schedule>>,
    pollers: HashMap<String, Vec<Poller>>,
    next_run: u64,
}

/// Provider over in-memory fixtures.
pub struct MockProvider {
    state: RwLock<MockState>,
    config: ConnectionConfig,
    connected: AtomicBool,
    /// Simulated server reachability; probes fail while this is false.
    online: AtomicBool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::with_fixtures()
    }
}

impl MockProvider {
    /// A provider with no data at all.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(MockState::default()),
            config: ConnectionConfig::default(),
            connected: AtomicBool::new(true),
            online: AtomicBool::new(true),
        }
    }

    /// A provider seeded with the demo corpus.
    pub fn with_fixtures() -> Self {
        Self {
            state: RwLock::new(seeded_state()),
            config: ConnectionConfig::default(),
            connected: AtomicBool::new(true),
            online: AtomicBool::new(true),
        }
    }

    /// Simulates the server going away (or coming back). While offline,
    /// probes and reconnects fail with a connection error.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub async fn insert_workflows(&self, namespace: &str, workflows: Vec<Workflow>) {
        let mut state = self.state.write().await;
        state
            .workflows
            .entry(namespace.to_string())
            .or_default()
            .extend(workflows);
    }

    pub async fn insert_history(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        events: Vec<EnhancedHistoryEvent>,
    ) {
        let mut state = self.state.write().await;
        state.histories.insert(
            (namespace.to_string(), workflow_id.to_string(), run_id.to_string()),
            events,
        );
    }

    pub async fn workflow_status(&self, namespace: &str, workflow_id: &str) -> Option<WorkflowStatus> {
        let state = self.state.read().await;
        state
            .workflows
            .get(namespace)?
            .iter()
            .find(|w| w.id == workflow_id)
            .map(|w| w.status)
    }

    fn ensure_online(&self) -> ProviderResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            self.connected.store(false, Ordering::SeqCst);
            Err(ProviderError::connection("server unreachable"))
        }
    }
}

fn close_workflow(workflow: &mut Workflow, status: WorkflowStatus) -> ProviderResult<()> {
    if workflow.status != WorkflowStatus::Running {
        return Err(ProviderError::conflict("workflow is not running"));
    }
    workflow.status = status;
    workflow.end_time = Some(Utc::now());
    Ok(())
}

fn find_workflow<'a>(
    state: &'a mut MockState,
    namespace: &str,
    workflow_id: &str,
    run_id: &str,
) -> ProviderResult<&'a mut Workflow> {
    state
        .workflows
        .get_mut(namespace)
        .and_then(|list| {
            list.iter_mut()
                .find(|w| w.id == workflow_id && (run_id.is_empty() || w.run_id == run_id))
        })
        .ok_or_else(|| ProviderError::not_found(format!("workflow {workflow_id}")))
}

#[async_trait]
impl Provider for MockProvider {
    async fn list_namespaces(&self) -> ProviderResult<Vec<Namespace>> {
        self.ensure_online()?;
        Ok(self.state.read().await.namespaces.clone())
    }

    async fn list_workflows(
        &self,
        namespace: &str,
        opts: ListOptions,
    ) -> ProviderResult<(Vec<Workflow>, String)> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let all = state.workflows.get(namespace).cloned().unwrap_or_default();
        let filtered = apply_visibility_query(all, &opts.query)?;
        Ok((filtered, String::new()))
    }

    async fn get_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Workflow> {
        self.ensure_online()?;
        let state = self.state.read().await;
        state
            .workflows
            .get(namespace)
            .and_then(|list| {
                list.iter()
                    .find(|w| w.id == workflow_id && (run_id.is_empty() || w.run_id == run_id))
            })
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("workflow {workflow_id}")))
    }

    async fn get_workflow_history(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<EnhancedHistoryEvent>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let key = (namespace.to_string(), workflow_id.to_string(), run_id.to_string());
        Ok(state.histories.get(&key).cloned().unwrap_or_default())
    }

    async fn describe_task_queue(
        &self,
        namespace: &str,
        name: &str,
    ) -> ProviderResult<(TaskQueueInfo, Vec<Poller>)> {
        self.ensure_online()?;
        let _ = namespace;
        let state = self.state.read().await;
        let pollers = state.pollers.get(name).cloned().unwrap_or_default();
        let info = TaskQueueInfo {
            name: name.to_string(),
            queue_type: TaskQueueType::Combined,
            poller_count: pollers.len(),
            backlog: 0,
        };
        Ok((info, pollers))
    }

    async fn list_schedules(
        &self,
        namespace: &str,
        _opts: ListOptions,
    ) -> ProviderResult<(Vec<Schedule>, String)> {
        self.ensure_online()?;
        let state = self.state.read().await;
        Ok((
            state.schedules.get(namespace).cloned().unwrap_or_default(),
            String::new(),
        ))
    }

    async fn describe_namespace(&self, namespace: &str) -> ProviderResult<NamespaceDetail> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let ns = state
            .namespaces
            .iter()
            .find(|n| n.name == namespace)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("namespace {namespace}")))?;
        Ok(NamespaceDetail {
            id: format!("ns-{}", ns.name),
            is_global: false,
            history_archival: "Disabled".to_string(),
            visibility_archival: "Disabled".to_string(),
            failover_version: 1,
            clusters: vec!["active".to_string()],
            data: Default::default(),
            namespace: ns,
        })
    }

    async fn get_reset_points(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<ResetPoint>> {
        let events = self
            .get_workflow_history(namespace, workflow_id, run_id)
            .await?;
        Ok(events
            .iter()
            .filter(|e| {
                e.event_type == "WorkflowTaskCompleted"
                    || FAILURE_EVENT_TYPES.contains(&e.event_type.as_str())
            })
            .map(|e| ResetPoint {
                event_id: e.id,
                event_type: e.event_type.clone(),
                timestamp: e.time,
                description: e.details.clone(),
                reason: e.failure.clone().unwrap_or_default(),
            })
            .collect())
    }

    async fn cancel_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        _reason: &str,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let workflow = find_workflow(&mut state, namespace, workflow_id, run_id)?;
        close_workflow(workflow, WorkflowStatus::Canceled)
    }

    async fn terminate_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        _reason: &str,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let workflow = find_workflow(&mut state, namespace, workflow_id, run_id)?;
        close_workflow(workflow, WorkflowStatus::Terminated)
    }

    async fn signal_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        signal_name: &str,
        _input: Option<Value>,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let workflow = find_workflow(&mut state, namespace, workflow_id, run_id)?;
        if workflow.status != WorkflowStatus::Running {
            return Err(ProviderError::conflict("workflow is not running"));
        }
        let run_id = workflow.run_id.clone();
        let key = (namespace.to_string(), workflow_id.to_string(), run_id);
        let history = state.histories.entry(key).or_default();
        let next_id = history.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        history.push(EnhancedHistoryEvent {
            id: next_id,
            event_type: "WorkflowExecutionSignaled".to_string(),
            time: Utc::now(),
            details: format!("SignalName: {signal_name}"),
            ..Default::default()
        });
        Ok(())
    }

    async fn delete_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let list = state
            .workflows
            .get_mut(namespace)
            .ok_or_else(|| ProviderError::not_found(format!("namespace {namespace}")))?;
        let before = list.len();
        list.retain(|w| !(w.id == workflow_id && (run_id.is_empty() || w.run_id == run_id)));
        if list.len() == before {
            return Err(ProviderError::not_found(format!("workflow {workflow_id}")));
        }
        state
            .histories
            .retain(|(ns, wid, rid), _| {
                !(ns == namespace && wid == workflow_id && (run_id.is_empty() || rid == run_id))
            });
        Ok(())
    }

    async fn reset_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        event_id: i64,
        _reason: &str,
    ) -> ProviderResult<String> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        state.next_run += 1;
        let new_run_id = format!("run-reset-{:04}", state.next_run);

        let original = find_workflow(&mut state, namespace, workflow_id, run_id)?.clone();
        let mut new_run = original;
        new_run.run_id = new_run_id.clone();
        new_run.status = WorkflowStatus::Running;
        new_run.start_time = Utc::now();
        new_run.end_time = None;

        // The new run keeps history up to the reset event.
        let old_key = (namespace.to_string(), workflow_id.to_string(), run_id.to_string());
        let prefix: Vec<EnhancedHistoryEvent> = state
            .histories
            .get(&old_key)
            .map(|events| events.iter().filter(|e| e.id < event_id).cloned().collect())
            .unwrap_or_default();
        state.histories.insert(
            (namespace.to_string(), workflow_id.to_string(), new_run_id.clone()),
            prefix,
        );

        if let Some(list) = state.workflows.get_mut(namespace) {
            list.push(new_run);
        }
        Ok(new_run_id)
    }

    async fn query_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        query_type: &str,
        _args: Option<Value>,
    ) -> ProviderResult<QueryOutcome> {
        self.ensure_online()?;
        let workflow = self.get_workflow(namespace, workflow_id, run_id).await?;
        if workflow.status != WorkflowStatus::Running {
            return Err(ProviderError::conflict("workflow is not running"));
        }
        match query_type {
            "__stack_trace" => Ok(QueryOutcome {
                result: "coroutine 1 [blocked on order-activity]".to_string(),
                error: None,
            }),
            "state" => Ok(QueryOutcome {
                result: "{\"step\":\"await-payment\"}".to_string(),
                error: None,
            }),
            other => Ok(QueryOutcome {
                result: String::new(),
                error: Some(format!("unknown query handler: {other}")),
            }),
        }
    }

    async fn cancel_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>> {
        self.ensure_online()?;
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let outcome = self
                .cancel_workflow(namespace, &target.workflow_id, &target.run_id, reason)
                .await;
            results.push(BatchResult {
                workflow_id: target.workflow_id.clone(),
                run_id: target.run_id.clone(),
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
            });
        }
        Ok(results)
    }

    async fn terminate_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>> {
        self.ensure_online()?;
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let outcome = self
                .terminate_workflow(namespace, &target.workflow_id, &target.run_id, reason)
                .await;
            results.push(BatchResult {
                workflow_id: target.workflow_id.clone(),
                run_id: target.run_id.clone(),
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
            });
        }
        Ok(results)
    }

    async fn pause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        _note: &str,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let schedule = find_schedule(&mut state, namespace, schedule_id)?;
        schedule.paused = true;
        Ok(())
    }

    async fn unpause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        _note: &str,
    ) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let schedule = find_schedule(&mut state, namespace, schedule_id)?;
        schedule.paused = false;
        Ok(())
    }

    async fn trigger_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let schedule = find_schedule(&mut state, namespace, schedule_id)?;
        schedule.total_actions += 1;
        schedule.last_run = Some(Utc::now());
        Ok(())
    }

    async fn delete_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let list = state
            .schedules
            .get_mut(namespace)
            .ok_or_else(|| ProviderError::not_found(format!("namespace {namespace}")))?;
        let before = list.len();
        list.retain(|s| s.id != schedule_id);
        if list.len() == before {
            return Err(ProviderError::not_found(format!("schedule {schedule_id}")));
        }
        Ok(())
    }

    async fn create_namespace(&self, req: NamespaceCreateRequest) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        if state.namespaces.iter().any(|n| n.name == req.name) {
            return Err(ProviderError::conflict(format!(
                "namespace {} already exists",
                req.name
            )));
        }
        state.namespaces.push(Namespace {
            name: req.name,
            state: NamespaceState::Active,
            retention: format!("{} days", req.retention_days),
            description: req.description,
            owner_email: req.owner_email,
        });
        Ok(())
    }

    async fn update_namespace(&self, req: NamespaceUpdateRequest) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let ns = state
            .namespaces
            .iter_mut()
            .find(|n| n.name == req.name)
            .ok_or_else(|| ProviderError::not_found(format!("namespace {}", req.name)))?;
        ns.retention = format!("{} days", req.retention_days);
        ns.description = req.description;
        ns.owner_email = req.owner_email;
        Ok(())
    }

    async fn deprecate_namespace(&self, name: &str) -> ProviderResult<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let ns = state
            .namespaces
            .iter_mut()
            .find(|n| n.name == name)
            .ok_or_else(|| ProviderError::not_found(format!("namespace {name}")))?;
        if ns.state != NamespaceState::Active {
            return Err(ProviderError::conflict("namespace is not active"));
        }
        ns.state = NamespaceState::Deprecated;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn check_connection(&self) -> ProviderResult<()> {
        self.ensure_online()?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn reconnect(&self) -> ProviderResult<()> {
        self.ensure_online()
            .map_err(|_| ProviderError::connection("reconnect failed: server unreachable"))?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn config(&self) -> ConnectionConfig {
        self.config.clone()
    }
}

fn find_schedule<'a>(
    state: &'a mut MockState,
    namespace: &str,
    schedule_id: &str,
) -> ProviderResult<&'a mut Schedule> {
    state
        .schedules
        .get_mut(namespace)
        .and_then(|list| list.iter_mut().find(|s| s.id == schedule_id))
        .ok_or_else(|| ProviderError::not_found(format!("schedule {schedule_id}")))
}

/// Evaluates the subset of the visibility grammar the fixtures need:
/// `ExecutionStatus='X'` and `WorkflowType='Y'` clauses joined by AND.
/// Time clauses are accepted and ignored. Anything else is rejected the
/// way the server would reject a malformed expression.
fn apply_visibility_query(
    workflows: Vec<Workflow>,
    query: &str,
) -> ProviderResult<Vec<Workflow>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(workflows);
    }

    let mut status: Option<WorkflowStatus> = None;
    let mut workflow_type: Option<String> = None;
    for clause in query.split(" AND ") {
        let clause = clause.trim();
        if let Some(value) = parse_equals(clause, "ExecutionStatus") {
            status = Some(WorkflowStatus::from_wire(&value));
        } else if let Some(value) = parse_equals(clause, "WorkflowType") {
            workflow_type = Some(value);
        } else if clause.starts_with("StartTime") || clause.starts_with("CloseTime") {
            // Accepted; fixture data is not time-indexed.
        } else {
            return Err(ProviderError::invalid(format!(
                "unsupported visibility clause: {clause}"
            )));
        }
    }

    Ok(workflows
        .into_iter()
        .filter(|w| status.map_or(true, |s| w.status == s))
        .filter(|w| {
            workflow_type
                .as_deref()
                .map_or(true, |t| w.workflow_type == t)
        })
        .collect())
}

fn parse_equals(clause: &str, field: &str) -> Option<String> {
    let rest = clause.strip_prefix(field)?.trim_start();
    let rest = rest.strip_prefix('=')?.trim();
    Some(rest.trim_matches('\'').to_string())
}

fn seeded_state() -> MockState {
    let mut state = MockState::default();
    let now = Utc::now();

    state.namespaces = vec![
        namespace("default", NamespaceState::Active, "7 days"),
        namespace("production", NamespaceState::Active, "30 days"),
        namespace("staging", NamespaceState::Active, "3 days"),
        namespace("development", NamespaceState::Active, "1 day"),
        namespace("archived", NamespaceState::Deprecated, "90 days"),
    ];

    let workflows = vec![
        workflow(
            "order-processing-abc123",
            "run-001-xyz",
            "OrderWorkflow",
            WorkflowStatus::Running,
            "order-tasks",
            now - Duration::minutes(5),
            None,
        ),
        workflow(
            "payment-xyz789",
            "run-002-abc",
            "PaymentWorkflow",
            WorkflowStatus::Completed,
            "payment-tasks",
            now - Duration::hours(1),
            Some(now - Duration::minutes(55)),
        ),
        workflow(
            "shipment-def456",
            "run-003-def",
            "ShipmentWorkflow",
            WorkflowStatus::Failed,
            "shipment-tasks",
            now - Duration::minutes(30),
            Some(now - Duration::minutes(25)),
        ),
        workflow(
            "inventory-check-111",
            "run-004-ghi",
            "InventoryWorkflow",
            WorkflowStatus::Running,
            "inventory-tasks",
            now - Duration::minutes(10),
            None,
        ),
        workflow(
            "user-signup-222",
            "run-005-jkl",
            "UserOnboardingWorkflow",
            WorkflowStatus::Completed,
            "user-tasks",
            now - Duration::hours(2),
            Some(now - Duration::minutes(105)),
        ),
    ];
    state.workflows.insert("default".to_string(), workflows);

    state.histories.insert(
        (
            "default".to_string(),
            "order-processing-abc123".to_string(),
            "run-001-xyz".to_string(),
        ),
        demo_history(now),
    );

    state.schedules.insert(
        "default".to_string(),
        vec![
            Schedule {
                id: "daily-report".to_string(),
                workflow_type: "ReportWorkflow".to_string(),
                spec: "0 9 * * *".to_string(),
                paused: false,
                next_run: Some(now + Duration::minutes(5)),
                last_run: Some(now - Duration::hours(1)),
                total_actions: 365,
                notes: "Daily report generation".to_string(),
            },
            Schedule {
                id: "hourly-sync".to_string(),
                workflow_type: "SyncWorkflow".to_string(),
                spec: "0 * * * *".to_string(),
                paused: false,
                next_run: Some(now + Duration::minutes(42)),
                last_run: Some(now - Duration::minutes(18)),
                total_actions: 8760,
                notes: "Inventory sync".to_string(),
            },
            Schedule {
                id: "weekly-cleanup".to_string(),
                workflow_type: "CleanupWorkflow".to_string(),
                spec: "0 3 * * 0".to_string(),
                paused: true,
                next_run: None,
                last_run: Some(now - Duration::days(9)),
                total_actions: 52,
                notes: "Paused during migration".to_string(),
            },
        ],
    );

    for queue in ["order-tasks", "payment-tasks", "shipment-tasks", "inventory-tasks", "user-tasks"] {
        state.pollers.insert(
            queue.to_string(),
            vec![
                poller("worker-1@host-001", TaskQueueType::Workflow, now - Duration::seconds(5)),
                poller("worker-1@host-001", TaskQueueType::Activity, now - Duration::seconds(3)),
                poller("worker-2@host-002", TaskQueueType::Workflow, now - Duration::seconds(10)),
            ],
        );
    }

    state
}

fn namespace(name: &str, ns_state: NamespaceState, retention: &str) -> Namespace {
    Namespace {
        name: name.to_string(),
        state: ns_state,
        retention: retention.to_string(),
        description: String::new(),
        owner_email: String::new(),
    }
}

fn workflow(
    id: &str,
    run_id: &str,
    workflow_type: &str,
    status: WorkflowStatus,
    task_queue: &str,
    start_time: weft_core::Timestamp,
    end_time: Option<weft_core::Timestamp>,
) -> Workflow {
    Workflow {
        id: id.to_string(),
        run_id: run_id.to_string(),
        workflow_type: workflow_type.to_string(),
        status,
        namespace: "default".to_string(),
        task_queue: task_queue.to_string(),
        start_time,
        end_time,
        parent_id: None,
        memo: Default::default(),
    }
}

fn poller(identity: &str, queue_type: TaskQueueType, last_access: weft_core::Timestamp) -> Poller {
    Poller {
        identity: identity.to_string(),
        last_access,
        queue_type,
        rate_per_second: 0.2,
    }
}

/// The retried-activity history corpus used across the history views.
fn demo_history(now: weft_core::Timestamp) -> Vec<EnhancedHistoryEvent> {
    let t = |m: i64| now - Duration::minutes(m);
    vec![
        EnhancedHistoryEvent {
            id: 1,
            event_type: "WorkflowExecutionStarted".to_string(),
            time: t(5),
            details: "WorkflowType: OrderWorkflow, TaskQueue: order-tasks".to_string(),
            task_queue: Some("order-tasks".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 2,
            event_type: "WorkflowTaskScheduled".to_string(),
            time: t(5),
            details: "TaskQueue: order-tasks".to_string(),
            task_queue: Some("order-tasks".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 3,
            event_type: "WorkflowTaskStarted".to_string(),
            time: t(5),
            details: "Identity: worker-1@host-001".to_string(),
            scheduled_event_id: Some(2),
            identity: Some("worker-1@host-001".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 4,
            event_type: "WorkflowTaskCompleted".to_string(),
            time: t(5),
            details: "ScheduledEventId: 2, StartedEventId: 3".to_string(),
            scheduled_event_id: Some(2),
            started_event_id: Some(3),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 5,
            event_type: "ActivityTaskScheduled".to_string(),
            time: t(4),
            details: "ActivityType: ProcessPayment, TaskQueue: order-tasks".to_string(),
            activity_type: Some("ProcessPayment".to_string()),
            activity_id: Some("1".to_string()),
            task_queue: Some("order-tasks".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 6,
            event_type: "ActivityTaskStarted".to_string(),
            time: t(4),
            details: "Identity: worker-1@host-001, Attempt: 1".to_string(),
            scheduled_event_id: Some(5),
            attempt: Some(1),
            identity: Some("worker-1@host-001".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 7,
            event_type: "ActivityTaskFailed".to_string(),
            time: t(3),
            details: "ScheduledEventId: 5, Failure: payment gateway timeout".to_string(),
            scheduled_event_id: Some(5),
            started_event_id: Some(6),
            failure: Some("payment gateway timeout".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 8,
            event_type: "ActivityTaskStarted".to_string(),
            time: t(2),
            details: "Identity: worker-1@host-001, Attempt: 2".to_string(),
            scheduled_event_id: Some(5),
            attempt: Some(2),
            identity: Some("worker-1@host-001".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 9,
            event_type: "ActivityTaskCompleted".to_string(),
            time: t(1),
            details: "ScheduledEventId: 5, Result: {\"paid\":true}".to_string(),
            scheduled_event_id: Some(5),
            started_event_id: Some(8),
            result: Some("{\"paid\":true}".to_string()),
            ..Default::default()
        },
        EnhancedHistoryEvent {
            id: 10,
            event_type: "TimerStarted".to_string(),
            time: t(1),
            details: "TimerId: wait-confirmation".to_string(),
            timer_id: Some("wait-confirmation".to_string()),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixtures_list_five_workflows() {
        let provider = MockProvider::with_fixtures();
        let (workflows, token) = provider
            .list_workflows("default", ListOptions::with_page_size(100))
            .await
            .unwrap();
        assert_eq!(workflows.len(), 5);
        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn visibility_query_filters_by_status_and_type() {
        let provider = MockProvider::with_fixtures();
        let (running, _) = provider
            .list_workflows(
                "default",
                ListOptions {
                    query: "ExecutionStatus='Running'".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(running.len(), 2);

        let (orders, _) = provider
            .list_workflows(
                "default",
                ListOptions {
                    query: "WorkflowType='OrderWorkflow' AND ExecutionStatus='Running'".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "order-processing-abc123");
    }

    #[tokio::test]
    async fn malformed_visibility_query_is_invalid_request() {
        let provider = MockProvider::with_fixtures();
        let err = provider
            .list_workflows(
                "default",
                ListOptions { query: "NotAField ~ 3".to_string(), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn cancel_is_gated_on_running_state() {
        let provider = MockProvider::with_fixtures();
        provider
            .cancel_workflow("default", "order-processing-abc123", "run-001-xyz", "test")
            .await
            .unwrap();
        assert_eq!(
            provider.workflow_status("default", "order-processing-abc123").await,
            Some(WorkflowStatus::Canceled)
        );

        let err = provider
            .cancel_workflow("default", "payment-xyz789", "run-002-abc", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict { .. }));
    }

    #[tokio::test]
    async fn batch_terminate_reports_per_item_outcomes() {
        let provider = MockProvider::with_fixtures();
        let targets = vec![
            WorkflowIdentifier {
                workflow_id: "order-processing-abc123".to_string(),
                run_id: "run-001-xyz".to_string(),
            },
            WorkflowIdentifier {
                workflow_id: "payment-xyz789".to_string(),
                run_id: "run-002-abc".to_string(),
            },
        ];
        let results = provider
            .terminate_workflows("default", &targets, "batch test")
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap().contains("not running"));
    }

    #[tokio::test]
    async fn reset_creates_new_run_with_history_prefix() {
        let provider = MockProvider::with_fixtures();
        let new_run = provider
            .reset_workflow("default", "order-processing-abc123", "run-001-xyz", 5, "retry")
            .await
            .unwrap();
        assert_ne!(new_run, "run-001-xyz");

        let history = provider
            .get_workflow_history("default", "order-processing-abc123", &new_run)
            .await
            .unwrap();
        assert!(history.iter().all(|e| e.id < 5));
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn offline_mode_fails_probe_and_flips_connected() {
        let provider = MockProvider::with_fixtures();
        provider.check_connection().await.unwrap();
        assert!(provider.is_connected());

        provider.set_online(false);
        let err = provider.check_connection().await.unwrap_err();
        assert!(err.is_connection());
        assert!(!provider.is_connected());

        provider.set_online(true);
        provider.reconnect().await.unwrap();
        assert!(provider.is_connected());
    }

    #[tokio::test]
    async fn reset_points_derived_from_history() {
        let provider = MockProvider::with_fixtures();
        let points = provider
            .get_reset_points("default", "order-processing-abc123", "run-001-xyz")
            .await
            .unwrap();
        // One WorkflowTaskCompleted and one ActivityTaskFailed.
        assert_eq!(points.len(), 2);
        assert!(points.iter().any(|p| p.is_failure_point()));
    }

    #[tokio::test]
    async fn deprecate_requires_active_namespace() {
        let provider = MockProvider::with_fixtures();
        provider.deprecate_namespace("staging").await.unwrap();
        let err = provider.deprecate_namespace("archived").await.unwrap_err();
        assert!(matches!(err, ProviderError::Conflict { .. }));
    }
}
