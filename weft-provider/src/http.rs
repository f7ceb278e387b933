//! HTTP/JSON implementation of the provider port.

use crate::{ConnectionConfig, ListOptions, Provider, ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use weft_core::{
    BatchResult, EnhancedHistoryEvent, Namespace, NamespaceCreateRequest, NamespaceDetail,
    NamespaceUpdateRequest, Poller, QueryOutcome, ResetPoint, Schedule, TaskQueueInfo,
    TaskQueueType, Workflow, WorkflowIdentifier,
};

const PAGE_SIZE: usize = 100;

/// Provider backed by the service's HTTP API.
pub struct HttpProvider {
    config: ConnectionConfig,
    base_url: String,
    client: RwLock<reqwest::Client>,
    connected: AtomicBool,
}

impl HttpProvider {
    /// Builds the transport and verifies it with one probe. Fails with a
    /// `Connection` error when the server is unreachable.
    pub async fn connect(config: ConnectionConfig) -> ProviderResult<Self> {
        let client = build_client(&config)?;
        let scheme = if config.tls.is_configured() { "https" } else { "http" };
        let provider = Self {
            base_url: format!("{scheme}://{}", config.address),
            config,
            client: RwLock::new(client),
            connected: AtomicBool::new(false),
        };
        provider.check_connection().await?;
        Ok(provider)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, path);
        let response = client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_response(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, path);
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_response(response).await
    }

    async fn delete(&self, path: &str) -> ProviderResult<()> {
        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, path);
        let response = client
            .delete(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_response::<Ack>(response).await.map(|_| ())
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ProviderResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::internal(format!("malformed response: {e}")));
        }

        let message = match response.text().await {
            Ok(text) => match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => body.message,
                Err(_) => text,
            },
            Err(e) => e.to_string(),
        };

        Err(match status.as_u16() {
            400 => ProviderError::invalid(message),
            403 => ProviderError::PermissionDenied { reason: message },
            404 => ProviderError::not_found(message),
            409 | 412 => ProviderError::conflict(message),
            _ => ProviderError::internal(format!("HTTP {}: {message}", status.as_u16())),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            self.connected.store(false, Ordering::SeqCst);
            ProviderError::connection(err.to_string())
        } else {
            ProviderError::internal(err.to_string())
        }
    }

    async fn describe_queue_side(
        &self,
        namespace: &str,
        name: &str,
        side: &str,
    ) -> ProviderResult<TaskQueueSide> {
        let path = format!("/api/v1/namespaces/{namespace}/task-queues/{name}");
        self.get_json(&path, &[("type", side)]).await
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn list_namespaces(&self) -> ProviderResult<Vec<Namespace>> {
        let mut namespaces = Vec::new();
        let mut token = String::new();
        loop {
            let page_size = PAGE_SIZE.to_string();
            let page: NamespacesPage = self
                .get_json(
                    "/api/v1/namespaces",
                    &[("page_size", page_size.as_str()), ("page_token", token.as_str())],
                )
                .await?;
            namespaces.extend(page.namespaces);
            token = page.next_page_token;
            if token.is_empty() {
                break;
            }
        }
        Ok(namespaces)
    }

    async fn list_workflows(
        &self,
        namespace: &str,
        opts: ListOptions,
    ) -> ProviderResult<(Vec<Workflow>, String)> {
        let page_size = if opts.page_size == 0 { PAGE_SIZE } else { opts.page_size };
        let page_size = page_size.to_string();
        let path = format!("/api/v1/namespaces/{namespace}/workflows");
        let page: WorkflowsPage = self
            .get_json(
                &path,
                &[
                    ("page_size", page_size.as_str()),
                    ("page_token", opts.page_token.as_str()),
                    ("query", opts.query.as_str()),
                ],
            )
            .await?;
        Ok((page.workflows, page.next_page_token))
    }

    async fn get_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Workflow> {
        let path = format!("/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}");
        self.get_json(&path, &[]).await
    }

    async fn get_workflow_history(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<EnhancedHistoryEvent>> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/history"
        );
        let mut events = Vec::new();
        let mut token = String::new();
        loop {
            let page: HistoryPage = self
                .get_json(&path, &[("page_token", token.as_str())])
                .await?;
            events.extend(page.events);
            token = page.next_page_token;
            if token.is_empty() {
                break;
            }
        }
        Ok(events)
    }

    async fn describe_task_queue(
        &self,
        namespace: &str,
        name: &str,
    ) -> ProviderResult<(TaskQueueInfo, Vec<Poller>)> {
        // The service reports workflow and activity pollers separately;
        // the client presents one combined queue.
        let workflow_side = self.describe_queue_side(namespace, name, "workflow").await?;
        let activity_side = self.describe_queue_side(namespace, name, "activity").await?;

        let mut pollers = workflow_side.pollers;
        pollers.extend(activity_side.pollers);

        let info = TaskQueueInfo {
            name: name.to_string(),
            queue_type: TaskQueueType::Combined,
            poller_count: pollers.len(),
            backlog: workflow_side.backlog + activity_side.backlog,
        };
        Ok((info, pollers))
    }

    async fn list_schedules(
        &self,
        namespace: &str,
        opts: ListOptions,
    ) -> ProviderResult<(Vec<Schedule>, String)> {
        let page_size = if opts.page_size == 0 { PAGE_SIZE } else { opts.page_size };
        let page_size = page_size.to_string();
        let path = format!("/api/v1/namespaces/{namespace}/schedules");
        let page: SchedulesPage = self
            .get_json(
                &path,
                &[
                    ("page_size", page_size.as_str()),
                    ("page_token", opts.page_token.as_str()),
                ],
            )
            .await?;
        Ok((page.schedules, page.next_page_token))
    }

    async fn describe_namespace(&self, namespace: &str) -> ProviderResult<NamespaceDetail> {
        let path = format!("/api/v1/namespaces/{namespace}");
        self.get_json(&path, &[]).await
    }

    async fn get_reset_points(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<Vec<ResetPoint>> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/reset-points"
        );
        let page: ResetPointsPage = self.get_json(&path, &[]).await?;
        Ok(page.points)
    }

    async fn cancel_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        reason: &str,
    ) -> ProviderResult<()> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/cancel"
        );
        self.post_json::<Ack, _>(&path, &ReasonBody { reason }).await.map(|_| ())
    }

    async fn terminate_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        reason: &str,
    ) -> ProviderResult<()> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/terminate"
        );
        self.post_json::<Ack, _>(&path, &ReasonBody { reason }).await.map(|_| ())
    }

    async fn signal_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        signal_name: &str,
        input: Option<Value>,
    ) -> ProviderResult<()> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/signal"
        );
        let body = SignalBody { name: signal_name, input };
        self.post_json::<Ack, _>(&path, &body).await.map(|_| ())
    }

    async fn delete_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
    ) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}");
        self.delete(&path).await
    }

    async fn reset_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        event_id: i64,
        reason: &str,
    ) -> ProviderResult<String> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/reset"
        );
        let response: ResetResponse = self
            .post_json(&path, &ResetBody { event_id, reason })
            .await?;
        Ok(response.run_id)
    }

    async fn query_workflow(
        &self,
        namespace: &str,
        workflow_id: &str,
        run_id: &str,
        query_type: &str,
        args: Option<Value>,
    ) -> ProviderResult<QueryOutcome> {
        let path = format!(
            "/api/v1/namespaces/{namespace}/workflows/{workflow_id}/runs/{run_id}/query"
        );
        self.post_json(&path, &QueryBody { query_type, args }).await
    }

    async fn cancel_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>> {
        let path = format!("/api/v1/namespaces/{namespace}/workflows:batch-cancel");
        let response: BatchResponse = self
            .post_json(&path, &BatchBody { targets, reason })
            .await?;
        Ok(response.results)
    }

    async fn terminate_workflows(
        &self,
        namespace: &str,
        targets: &[WorkflowIdentifier],
        reason: &str,
    ) -> ProviderResult<Vec<BatchResult>> {
        let path = format!("/api/v1/namespaces/{namespace}/workflows:batch-terminate");
        let response: BatchResponse = self
            .post_json(&path, &BatchBody { targets, reason })
            .await?;
        Ok(response.results)
    }

    async fn pause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        note: &str,
    ) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{namespace}/schedules/{schedule_id}/pause");
        self.post_json::<Ack, _>(&path, &NoteBody { note }).await.map(|_| ())
    }

    async fn unpause_schedule(
        &self,
        namespace: &str,
        schedule_id: &str,
        note: &str,
    ) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{namespace}/schedules/{schedule_id}/unpause");
        self.post_json::<Ack, _>(&path, &NoteBody { note }).await.map(|_| ())
    }

    async fn trigger_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{namespace}/schedules/{schedule_id}/trigger");
        self.post_json::<Ack, _>(&path, &Empty {}).await.map(|_| ())
    }

    async fn delete_schedule(&self, namespace: &str, schedule_id: &str) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{namespace}/schedules/{schedule_id}");
        self.delete(&path).await
    }

    async fn create_namespace(&self, req: NamespaceCreateRequest) -> ProviderResult<()> {
        self.post_json::<Ack, _>("/api/v1/namespaces", &req).await.map(|_| ())
    }

    async fn update_namespace(&self, req: NamespaceUpdateRequest) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{}/update", req.name);
        self.post_json::<Ack, _>(&path, &req).await.map(|_| ())
    }

    async fn deprecate_namespace(&self, name: &str) -> ProviderResult<()> {
        let path = format!("/api/v1/namespaces/{name}/deprecate");
        self.post_json::<Ack, _>(&path, &Empty {}).await.map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn check_connection(&self) -> ProviderResult<()> {
        // Listing one namespace is the cheapest round-trip the API offers.
        let result: ProviderResult<NamespacesPage> = self
            .get_json("/api/v1/namespaces", &[("page_size", "1")])
            .await;
        match result {
            Ok(_) => {
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                self.connected.store(false, Ordering::SeqCst);
                tracing::debug!(error = %err, "connection probe failed");
                if err.is_connection() {
                    Err(err)
                } else {
                    Err(ProviderError::connection(err.to_string()))
                }
            }
        }
    }

    async fn reconnect(&self) -> ProviderResult<()> {
        {
            let mut client = self.client.write().await;
            *client = build_client(&self.config)?;
        }
        self.connected.store(false, Ordering::SeqCst);
        self.check_connection().await.map_err(|err| {
            ProviderError::connection(format!("reconnect failed: {err}"))
        })?;
        tracing::info!(address = %self.config.address, "reconnected");
        Ok(())
    }

    fn config(&self) -> ConnectionConfig {
        self.config.clone()
    }
}

fn build_client(config: &ConnectionConfig) -> ProviderResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if config.tls.is_configured() {
        builder = builder.use_rustls_tls();
        if !config.tls.ca_path.is_empty() {
            let pem = std::fs::read(&config.tls.ca_path)
                .map_err(|e| ProviderError::connection(format!("read CA certificate: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| ProviderError::connection(format!("parse CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if !config.tls.cert_path.is_empty() && !config.tls.key_path.is_empty() {
            let mut pem = std::fs::read(&config.tls.cert_path)
                .map_err(|e| ProviderError::connection(format!("read client certificate: {e}")))?;
            let key = std::fs::read(&config.tls.key_path)
                .map_err(|e| ProviderError::connection(format!("read client key: {e}")))?;
            pem.extend_from_slice(&key);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| ProviderError::connection(format!("parse client identity: {e}")))?;
            builder = builder.identity(identity);
        }
        if config.tls.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| ProviderError::connection(format!("build transport: {e}")))
}

// ----------------------------------------------------------------------
// Wire shapes
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    #[serde(default)]
    code: String,
    message: String,
}

/// Mutation endpoints return `{}` on success.
#[derive(Debug, Deserialize)]
struct Ack {}

#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct NamespacesPage {
    namespaces: Vec<Namespace>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowsPage {
    workflows: Vec<Workflow>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
struct HistoryPage {
    events: Vec<EnhancedHistoryEvent>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
struct SchedulesPage {
    schedules: Vec<Schedule>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
struct TaskQueueSide {
    #[serde(default)]
    backlog: u64,
    pollers: Vec<Poller>,
}

#[derive(Debug, Deserialize)]
struct ResetPointsPage {
    points: Vec<ResetPoint>,
}

#[derive(Debug, Serialize)]
struct ReasonBody<'a> {
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct SignalBody<'a> {
    name: &'a str,
    input: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ResetBody<'a> {
    event_id: i64,
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResetResponse {
    run_id: String,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query_type: &'a str,
    args: Option<Value>,
}

#[derive(Debug, Serialize)]
struct BatchBody<'a> {
    targets: &'a [WorkflowIdentifier],
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    results: Vec<BatchResult>,
}

#[derive(Debug, Serialize)]
struct NoteBody<'a> {
    note: &'a str,
}
