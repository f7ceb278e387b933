//! Engine tests: stack lifecycle, fetch discipline, filters, batch
//! operations and the supervisor, driven against the in-memory provider.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use weft_core::{Workflow, WorkflowStatus};
use weft_provider::{MockProvider, Provider};
use weft_tui::app::App;
use weft_tui::config::TuiConfig;
use weft_tui::events::{ConnectionStatus, Ctx, ScreenId, TuiEvent, UiSender};
use weft_tui::modals::batch::{BatchItem, BatchItemStatus, BatchKind, BatchModal};
use weft_tui::screen::{Action, Screen};
use weft_tui::screens::event_history::{EventHistory, ViewMode};
use weft_tui::screens::task_queue::TaskQueues;
use weft_tui::screens::workflow_detail::WorkflowDetail;
use weft_tui::screens::workflow_list::WorkflowList;
use weft_tui::supervisor::spawn_supervisor;

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn test_ctx(provider: Arc<dyn Provider>) -> (Ctx, UnboundedReceiver<TuiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = Ctx::new(provider, UiSender::new(tx), TuiConfig::default());
    (ctx, rx)
}

/// Feeds pending completion messages for `id` into `handler` until the
/// queue stays quiet. Returns every action the handler produced.
async fn pump<F>(rx: &mut UnboundedReceiver<TuiEvent>, id: ScreenId, mut handler: F) -> Vec<Action>
where
    F: FnMut(weft_tui::events::ScreenMsg) -> Vec<Action>,
{
    let mut actions = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await {
        if let TuiEvent::Screen(target, msg) = event {
            if target == id {
                actions.extend(handler(msg));
            }
        }
    }
    actions
}

fn sample_workflow(id: &str, workflow_type: &str, status: WorkflowStatus) -> Workflow {
    Workflow {
        id: id.to_string(),
        run_id: format!("{id}-run"),
        workflow_type: workflow_type.to_string(),
        status,
        namespace: "default".to_string(),
        task_queue: "tasks".to_string(),
        start_time: Utc::now(),
        end_time: None,
        parent_id: None,
        memo: BTreeMap::new(),
    }
}

// ----------------------------------------------------------------------
// S1: cold start shows the namespace corpus with row 0 selected.
// ----------------------------------------------------------------------

#[tokio::test]
async fn cold_start_lists_namespaces() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);
    let dir = tempfile::TempDir::new().unwrap();
    let mut app = App::new(ctx, dir.path().join("config.toml"), "default");

    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(150), rx.recv()).await
    {
        app.handle_event(event);
    }

    let Some(Screen::NamespaceList(list)) = app.current_screen() else {
        panic!("expected namespace list at root");
    };
    assert_eq!(list.selection(), 0);
    let first = &list.namespaces()[0];
    assert_eq!(first.name, "default");
    assert_eq!(first.retention, "7 days");
    assert_eq!(app.depth(), 1);
}

// ----------------------------------------------------------------------
// S2: substring filter narrows in dataset order and preserves the
// selected item across a filter clear.
// ----------------------------------------------------------------------

#[tokio::test]
async fn filter_narrows_and_preserves_selection() {
    let provider = Arc::new(MockProvider::empty());
    provider
        .insert_workflows(
            "default",
            vec![
                sample_workflow("order-1", "OrderWorkflow", WorkflowStatus::Running),
                sample_workflow("payment-1", "PaymentWorkflow", WorkflowStatus::Running),
                sample_workflow("order-2", "OrderWorkflow", WorkflowStatus::Completed),
                sample_workflow("user-1", "UserWorkflow", WorkflowStatus::Running),
                sample_workflow("shipment-1", "ShipmentWorkflow", WorkflowStatus::Failed),
            ],
        )
        .await;
    let (ctx, mut rx) = test_ctx(provider);

    let mut list = WorkflowList::new("default");
    list.start(&ctx);
    let id = list.id();
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;
    assert_eq!(list.visible().len(), 5);

    list.on_key(key('/'), &ctx);
    for c in "order".chars() {
        list.on_key(key(c), &ctx);
    }
    list.on_key(key_code(KeyCode::Enter), &ctx);
    let ids: Vec<&str> = list.visible().iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["order-1", "order-2"]);

    // Select order-2, then clear the filter: the selection follows the
    // item, not the position.
    list.on_key(key_code(KeyCode::Down), &ctx);
    assert_eq!(list.visible()[list.selection()].id, "order-2");
    list.on_key(key('/'), &ctx);
    for _ in 0..5 {
        list.on_key(key_code(KeyCode::Backspace), &ctx);
    }
    list.on_key(key_code(KeyCode::Enter), &ctx);
    assert_eq!(list.visible().len(), 5);
    assert_eq!(list.visible()[list.selection()].id, "order-2");
}

// ----------------------------------------------------------------------
// Filter invariant: every visible row matches the filter.
// ----------------------------------------------------------------------

#[tokio::test]
async fn visible_rows_always_match_filter() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let mut list = WorkflowList::new("default");
    list.start(&ctx);
    let id = list.id();
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;

    list.on_key(key('/'), &ctx);
    for c in "work".chars() {
        list.on_key(key(c), &ctx);
    }
    for workflow in list.visible() {
        let haystack = format!(
            "{} {} {}",
            workflow.id.to_lowercase(),
            workflow.workflow_type.to_lowercase(),
            workflow.status.to_string().to_lowercase()
        );
        assert!(haystack.contains("work"), "{} must match", workflow.id);
    }
}

// ----------------------------------------------------------------------
// Ordering: after overlapping refreshes drain, the state equals the
// last fetch's result.
// ----------------------------------------------------------------------

#[tokio::test]
async fn refresh_after_mutation_shows_latest_state() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(Arc::clone(&provider) as Arc<dyn Provider>);

    let mut list = WorkflowList::new("default");
    list.start(&ctx);
    let id = list.id();
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;
    let before = list
        .visible()
        .iter()
        .find(|w| w.id == "order-processing-abc123")
        .unwrap();
    assert_eq!(before.status, WorkflowStatus::Running);

    provider
        .cancel_workflow("default", "order-processing-abc123", "run-001-xyz", "test")
        .await
        .unwrap();

    // Two overlapping refreshes; both execute, the later wins.
    list.on_key(key('r'), &ctx);
    list.on_key(key('r'), &ctx);
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;

    let after = list
        .visible()
        .iter()
        .find(|w| w.id == "order-processing-abc123")
        .unwrap();
    assert_eq!(after.status, WorkflowStatus::Canceled);
}

// ----------------------------------------------------------------------
// Refresh preserves selection by position; the multi-selection clears.
// ----------------------------------------------------------------------

#[tokio::test]
async fn refresh_preserves_selection_by_position() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let mut list = WorkflowList::new("default");
    list.start(&ctx);
    let id = list.id();
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;

    list.on_key(key_code(KeyCode::Down), &ctx);
    list.on_key(key_code(KeyCode::Down), &ctx);
    assert_eq!(list.selection(), 2);

    list.on_key(key('v'), &ctx);
    list.on_key(key(' '), &ctx);

    list.on_key(key('r'), &ctx);
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;
    assert_eq!(list.selection(), 2);

    // Dataset changed, so the marked rows are gone: 'c' with an empty
    // selection must not open a batch modal.
    let actions = list.on_key(key('c'), &ctx);
    assert!(actions.is_empty());
}

// ----------------------------------------------------------------------
// S3: batch terminate with partial failure reports per item, then the
// invoking screen is told to refresh.
// ----------------------------------------------------------------------

#[tokio::test]
async fn batch_terminate_partial_failure() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let parent: ScreenId = 4242;
    let mut modal = BatchModal::new(
        parent,
        BatchKind::Terminate,
        "default",
        vec![
            BatchItem::pending("order-processing-abc123", "run-001-xyz"),
            BatchItem::pending("payment-xyz789", "run-002-abc"),
        ],
    );
    let id = modal.id();

    modal.on_key(key_code(KeyCode::Enter), &ctx);
    pump(&mut rx, id, |msg| modal.on_msg(msg, &ctx)).await;

    assert_eq!(modal.items()[0].status, BatchItemStatus::Completed);
    match &modal.items()[1].status {
        BatchItemStatus::Failed(reason) => assert!(reason.contains("not running")),
        other => panic!("expected failure, got {other:?}"),
    }

    let actions = modal.on_key(key_code(KeyCode::Enter), &ctx);
    assert!(actions.iter().any(|a| matches!(a, Action::Pop)));
    assert!(actions.iter().any(|a| matches!(
        a,
        Action::ToScreen(target, weft_tui::events::ScreenMsg::BatchCompleted) if *target == parent
    )));
}

// ----------------------------------------------------------------------
// Mutation pipeline: delete runs behind the confirm modal and pops the
// detail screen on success.
// ----------------------------------------------------------------------

#[tokio::test]
async fn delete_flows_through_confirm_modal() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(Arc::clone(&provider) as Arc<dyn Provider>);

    let mut detail = WorkflowDetail::new("default", "payment-xyz789", "run-002-abc");
    detail.start(&ctx);
    let detail_id = detail.id();
    pump(&mut rx, detail_id, |msg| detail.on_msg(msg, &ctx)).await;
    assert!(detail.workflow().is_some());

    let mut actions = detail.on_key(key('D'), &ctx);
    let Some(Action::Push(screen)) = actions.pop() else {
        panic!("expected confirm modal push");
    };
    let Screen::Confirm(mut confirm) = *screen else {
        panic!("expected confirm modal");
    };

    confirm.on_key(key_code(KeyCode::Enter), &ctx);
    let confirm_id = confirm.id();
    let confirm_actions = pump(&mut rx, confirm_id, |msg| confirm.on_msg(msg, &ctx)).await;

    // The modal closes after the call completes and forwards the outcome.
    assert!(confirm_actions.iter().any(|a| matches!(a, Action::Pop)));
    let forwarded = confirm_actions.iter().find_map(|a| match a {
        Action::ToScreen(target, msg) if *target == detail_id => Some(msg),
        _ => None,
    });
    assert!(forwarded.is_some());

    // The workflow is gone from the provider.
    assert!(provider
        .get_workflow("default", "payment-xyz789", "run-002-abc")
        .await
        .is_err());
}

// ----------------------------------------------------------------------
// View modes cycle list → tree → timeline → list without data mutation.
// ----------------------------------------------------------------------

#[tokio::test]
async fn event_view_modes_cycle_without_data_mutation() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let mut history = EventHistory::new("default", "order-processing-abc123", "run-001-xyz");
    history.start(&ctx);
    let id = history.id();
    pump(&mut rx, id, |msg| history.on_msg(msg, &ctx)).await;

    let nodes_before = history.tree().nodes.clone();
    assert_eq!(history.mode(), ViewMode::Tree);
    history.on_key(key('v'), &ctx);
    assert_eq!(history.mode(), ViewMode::Timeline);
    history.on_key(key('v'), &ctx);
    assert_eq!(history.mode(), ViewMode::List);
    history.on_key(key('v'), &ctx);
    assert_eq!(history.mode(), ViewMode::Tree);
    assert_eq!(history.tree().nodes, nodes_before);

    // The retried activity aggregates both attempts.
    let activity = history
        .tree()
        .nodes
        .iter()
        .find(|n| n.name == "ActivityTask(ProcessPayment)")
        .expect("activity node");
    assert_eq!(activity.attempts, 2);
}

// ----------------------------------------------------------------------
// Task queues derive from recent workflows; describing fills pollers.
// ----------------------------------------------------------------------

#[tokio::test]
async fn task_queues_derived_and_described() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let mut queues = TaskQueues::new("default");
    queues.start(&ctx);
    let id = queues.id();
    let actions = pump(&mut rx, id, |msg| queues.on_msg(msg, &ctx)).await;

    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SetQueueCount(5))));
}

// ----------------------------------------------------------------------
// Auto-refresh: toggling twice leaves no live ticker.
// ----------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn auto_refresh_toggle_is_leak_free() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (ctx, mut rx) = test_ctx(provider);

    let mut list = WorkflowList::new("default");
    list.start(&ctx);
    let id = list.id();
    pump(&mut rx, id, |msg| list.on_msg(msg, &ctx)).await;

    // On, then off.
    list.on_key(key('a'), &ctx);
    list.on_key(key('a'), &ctx);

    tokio::time::advance(Duration::from_secs(16)).await;
    tokio::task::yield_now().await;
    let mut saw_tick = false;
    while let Ok(event) = rx.try_recv() {
        if let TuiEvent::Screen(_, weft_tui::events::ScreenMsg::RefreshTick) = event {
            saw_tick = true;
        }
    }
    assert!(!saw_tick, "stopped ticker must not fire");

    // On again: ticks flow.
    list.on_key(key('a'), &ctx);
    tokio::time::advance(Duration::from_secs(6)).await;
    tokio::task::yield_now().await;
    let mut saw_tick = false;
    while let Ok(event) = rx.try_recv() {
        if let TuiEvent::Screen(_, weft_tui::events::ScreenMsg::RefreshTick) = event {
            saw_tick = true;
        }
    }
    assert!(saw_tick, "live ticker must fire");
}

// ----------------------------------------------------------------------
// S6: history navigation in the visibility input.
// ----------------------------------------------------------------------

#[tokio::test]
async fn visibility_history_navigation() {
    use weft_tui::filter::SearchHistory;
    use weft_tui::modals::visibility::VisibilityInputModal;

    let provider = Arc::new(MockProvider::empty());
    let (ctx, _rx) = test_ctx(provider);

    let mut history = SearchHistory::new();
    history.add("ExecutionStatus='Running'");
    history.add("WorkflowType='OrderWorkflow'");
    history.add("ExecutionStatus='Failed'");

    let mut modal = VisibilityInputModal::new(7, "ExecutionStatus='Failed'", history);

    modal.on_key(key_code(KeyCode::Up), &ctx);
    assert_eq!(modal.input(), "ExecutionStatus='Failed'");
    modal.on_key(key_code(KeyCode::Up), &ctx);
    assert_eq!(modal.input(), "WorkflowType='OrderWorkflow'");
    modal.on_key(key_code(KeyCode::Up), &ctx);
    assert_eq!(modal.input(), "ExecutionStatus='Running'");

    modal.on_key(key_code(KeyCode::Down), &ctx);
    assert_eq!(modal.input(), "WorkflowType='OrderWorkflow'");
    modal.on_key(key_code(KeyCode::Down), &ctx);
    assert_eq!(modal.input(), "ExecutionStatus='Failed'");
    modal.on_key(key_code(KeyCode::Down), &ctx);
    assert_eq!(modal.input(), "");
}

// ----------------------------------------------------------------------
// S4: connection loss flips status, backoff retries, recovery restores.
// ----------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn supervisor_detects_loss_and_recovers() {
    let provider = Arc::new(MockProvider::with_fixtures());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sender = UiSender::new(tx);
    let handle = spawn_supervisor(Arc::clone(&provider) as Arc<dyn Provider>, sender);

    let mut statuses: Vec<ConnectionStatus> = Vec::new();

    async fn advance_collecting(
        seconds: u64,
        statuses: &mut Vec<ConnectionStatus>,
        rx: &mut UnboundedReceiver<TuiEvent>,
    ) {
        for _ in 0..seconds {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
            while let Ok(event) = rx.try_recv() {
                if let TuiEvent::Connection(status) = event {
                    statuses.push(status);
                }
            }
        }
    }

    // Healthy probe.
    advance_collecting(11, &mut statuses, &mut rx).await;
    assert_eq!(statuses.last(), Some(&ConnectionStatus::Connected));

    // Server goes away: within one tick the status shows Disconnected
    // and a reconnect attempt spawns.
    provider.set_online(false);
    advance_collecting(10, &mut statuses, &mut rx).await;
    assert!(statuses.contains(&ConnectionStatus::Disconnected));
    assert!(statuses.contains(&ConnectionStatus::Reconnecting));

    // A few failing cycles, then the server comes back.
    advance_collecting(25, &mut statuses, &mut rx).await;
    provider.set_online(true);
    advance_collecting(40, &mut statuses, &mut rx).await;
    assert_eq!(statuses.last(), Some(&ConnectionStatus::Connected));

    handle.stop();
}
