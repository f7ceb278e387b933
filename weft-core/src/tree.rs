//! Event-tree construction for the history views.
//!
//! The flat event list is folded left-to-right: events carrying a
//! `scheduled_event_id` or `started_event_id` join the node anchored at the
//! event they reference, everything else opens a node of its own. An
//! activity node therefore aggregates its Scheduled, Started and terminal
//! events, with retries reflected in the `attempts` counter.

use crate::{EnhancedHistoryEvent, Timestamp};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Aggregate status of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
    TimedOut,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Pending => "Pending",
            NodeStatus::Running => "Running",
            NodeStatus::Completed => "Completed",
            NodeStatus::Failed => "Failed",
            NodeStatus::Canceled => "Canceled",
            NodeStatus::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

impl NodeStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, NodeStatus::Failed | NodeStatus::TimedOut)
    }
}

/// One aggregated node of the event tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTreeNode {
    pub name: String,
    pub status: NodeStatus,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    /// Number of `ActivityTaskStarted` events linked to this node.
    pub attempts: u32,
    /// The events folded into this node, in arrival order.
    pub events: Vec<EnhancedHistoryEvent>,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
}

impl EventTreeNode {
    fn new(event: &EnhancedHistoryEvent, parent: Option<usize>) -> Self {
        Self {
            name: node_name(event),
            status: initial_status(event),
            start_time: event.time,
            end_time: None,
            attempts: 0,
            events: vec![event.clone()],
            children: Vec::new(),
            parent,
        }
    }

    /// Wall-clock duration from the anchor event to the last terminal
    /// event, or `None` while the node is still open.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// Arena-backed event tree. Node indices are stable, which lets the tree
/// and timeline widgets carry selection and expansion state across frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTree {
    pub nodes: Vec<EventTreeNode>,
    pub roots: Vec<usize>,
}

impl EventTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the first node whose status is a failure, if any.
    pub fn first_failed(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.status.is_failure())
    }
}

/// Folds the flat event list into a tree. See the module docs for the
/// linking rule.
pub fn build_event_tree(events: &[EnhancedHistoryEvent]) -> EventTree {
    let mut tree = EventTree::default();
    // Every event id placed so far maps to the node that owns it, so a
    // follow-up referencing either the scheduled or the started event of a
    // node lands on the same node.
    let mut owner: HashMap<i64, usize> = HashMap::new();
    let mut workflow_root: Option<usize> = None;

    for event in events {
        if let Some(parent_id) = event.parent_link() {
            if let Some(&idx) = owner.get(&parent_id) {
                fold_into(&mut tree.nodes[idx], event);
                owner.insert(event.id, idx);
                continue;
            }
        }

        if event.event_type == "WorkflowExecutionStarted" {
            let idx = push_node(&mut tree, event, None);
            owner.insert(event.id, idx);
            workflow_root = Some(idx);
            continue;
        }

        // Terminal workflow lifecycle events close the workflow node.
        if is_workflow_close(&event.event_type) {
            if let Some(idx) = workflow_root {
                fold_into(&mut tree.nodes[idx], event);
                owner.insert(event.id, idx);
                continue;
            }
        }

        let idx = push_node(&mut tree, event, workflow_root);
        owner.insert(event.id, idx);
    }

    tree
}

fn push_node(tree: &mut EventTree, event: &EnhancedHistoryEvent, parent: Option<usize>) -> usize {
    let idx = tree.nodes.len();
    tree.nodes.push(EventTreeNode::new(event, parent));
    match parent {
        Some(p) => tree.nodes[p].children.push(idx),
        None => tree.roots.push(idx),
    }
    idx
}

fn fold_into(node: &mut EventTreeNode, event: &EnhancedHistoryEvent) {
    if event.event_type.ends_with("Started") {
        node.status = NodeStatus::Running;
        if event.event_type == "ActivityTaskStarted" {
            node.attempts += 1;
        }
    } else if let Some(status) = terminal_status(&event.event_type) {
        node.status = status;
        node.end_time = Some(event.time);
    }
    node.events.push(event.clone());
}

fn initial_status(event: &EnhancedHistoryEvent) -> NodeStatus {
    if event.event_type.ends_with("Scheduled") || event.event_type.ends_with("Initiated") {
        NodeStatus::Pending
    } else if let Some(status) = terminal_status(&event.event_type) {
        // Single-event nodes carry their own terminal status.
        status
    } else {
        NodeStatus::Running
    }
}

fn terminal_status(event_type: &str) -> Option<NodeStatus> {
    if event_type.ends_with("Completed") || event_type.ends_with("Fired") {
        Some(NodeStatus::Completed)
    } else if event_type.ends_with("Failed") {
        Some(NodeStatus::Failed)
    } else if event_type.ends_with("TimedOut") {
        Some(NodeStatus::TimedOut)
    } else if event_type.ends_with("Canceled") || event_type.ends_with("Terminated") {
        Some(NodeStatus::Canceled)
    } else {
        None
    }
}

fn is_workflow_close(event_type: &str) -> bool {
    matches!(
        event_type,
        "WorkflowExecutionCompleted"
            | "WorkflowExecutionFailed"
            | "WorkflowExecutionTimedOut"
            | "WorkflowExecutionCanceled"
            | "WorkflowExecutionTerminated"
            | "WorkflowExecutionContinuedAsNew"
    )
}

/// Display name for the node anchored at `event`.
fn node_name(event: &EnhancedHistoryEvent) -> String {
    match event.event_type.as_str() {
        "ActivityTaskScheduled" => {
            let label = event
                .activity_type
                .as_deref()
                .or(event.activity_id.as_deref())
                .unwrap_or("?");
            format!("ActivityTask({label})")
        }
        "TimerStarted" => {
            let label = event.timer_id.as_deref().unwrap_or("?");
            format!("Timer({label})")
        }
        "WorkflowTaskScheduled" => "WorkflowTask".to_string(),
        "StartChildWorkflowExecutionInitiated" => {
            let label = event.activity_type.as_deref().unwrap_or("child");
            format!("ChildWorkflow({label})")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
    }

    fn ev(id: i64, event_type: &str, minute: u32) -> EnhancedHistoryEvent {
        EnhancedHistoryEvent {
            id,
            event_type: event_type.to_string(),
            time: at(minute),
            ..Default::default()
        }
    }

    /// The retried-activity corpus from the history view: one activity
    /// scheduled once, started twice, completed on the second attempt.
    fn retried_activity_history() -> Vec<EnhancedHistoryEvent> {
        vec![
            ev(1, "WorkflowExecutionStarted", 0),
            ev(2, "WorkflowTaskScheduled", 0),
            EnhancedHistoryEvent {
                scheduled_event_id: Some(2),
                ..ev(3, "WorkflowTaskStarted", 0)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(2),
                started_event_id: Some(3),
                ..ev(4, "WorkflowTaskCompleted", 0)
            },
            EnhancedHistoryEvent {
                activity_id: Some("A".to_string()),
                ..ev(5, "ActivityTaskScheduled", 1)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(5),
                attempt: Some(1),
                ..ev(6, "ActivityTaskStarted", 1)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(5),
                started_event_id: Some(6),
                ..ev(7, "ActivityTaskFailed", 2)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(5),
                attempt: Some(2),
                ..ev(8, "ActivityTaskStarted", 2)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(5),
                started_event_id: Some(8),
                ..ev(9, "ActivityTaskCompleted", 5)
            },
        ]
    }

    #[test]
    fn retried_activity_aggregates_attempts() {
        let tree = build_event_tree(&retried_activity_history());

        assert_eq!(tree.roots.len(), 1);
        let root = &tree.nodes[tree.roots[0]];
        assert_eq!(root.name, "WorkflowExecutionStarted");
        assert_eq!(root.children.len(), 2);

        let activity = tree
            .nodes
            .iter()
            .find(|n| n.name == "ActivityTask(A)")
            .expect("activity node");
        assert_eq!(activity.attempts, 2);
        assert_eq!(activity.status, NodeStatus::Completed);
        assert_eq!(activity.duration(), Some(at(5) - at(1)));
        // Scheduled + 2 starts + 1 failure + 1 completion.
        assert_eq!(activity.events.len(), 5);
    }

    #[test]
    fn every_non_root_node_has_one_parent() {
        let tree = build_event_tree(&retried_activity_history());
        for (idx, node) in tree.nodes.iter().enumerate() {
            match node.parent {
                Some(p) => assert!(tree.nodes[p].children.contains(&idx)),
                None => assert!(tree.roots.contains(&idx)),
            }
        }
    }

    #[test]
    fn timer_fired_links_through_started_event_id() {
        let events = vec![
            ev(1, "WorkflowExecutionStarted", 0),
            EnhancedHistoryEvent {
                timer_id: Some("wait-30s".to_string()),
                ..ev(13, "TimerStarted", 1)
            },
            EnhancedHistoryEvent {
                timer_id: Some("wait-30s".to_string()),
                started_event_id: Some(13),
                ..ev(14, "TimerFired", 2)
            },
        ];
        let tree = build_event_tree(&events);
        let timer = tree
            .nodes
            .iter()
            .find(|n| n.name == "Timer(wait-30s)")
            .expect("timer node");
        assert_eq!(timer.status, NodeStatus::Completed);
        assert_eq!(timer.events.len(), 2);
    }

    #[test]
    fn workflow_close_event_folds_into_root() {
        let events = vec![
            ev(1, "WorkflowExecutionStarted", 0),
            ev(2, "WorkflowExecutionCompleted", 3),
        ];
        let tree = build_event_tree(&events);
        assert_eq!(tree.nodes.len(), 1);
        let root = &tree.nodes[0];
        assert_eq!(root.status, NodeStatus::Completed);
        assert_eq!(root.duration(), Some(at(3) - at(0)));
    }

    #[test]
    fn failed_activity_is_found_by_first_failed() {
        let mut events = retried_activity_history();
        // Truncate after the failure so the activity never completes.
        events.truncate(7);
        let tree = build_event_tree(&events);
        let idx = tree.first_failed().expect("failure present");
        assert_eq!(tree.nodes[idx].name, "ActivityTask(A)");

        let complete = build_event_tree(&retried_activity_history());
        assert_eq!(complete.first_failed(), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Deterministic event list from a vector of choices: anchors,
        /// linked follow-ups and loose events in arbitrary interleavings.
        fn events_from(choices: &[u8]) -> Vec<EnhancedHistoryEvent> {
            let mut events = Vec::with_capacity(choices.len() + 1);
            let mut anchors: Vec<i64> = Vec::new();
            events.push(ev(1, "WorkflowExecutionStarted", 0));
            for (i, &choice) in choices.iter().enumerate() {
                let id = i as i64 + 2;
                let minute = (i as u32 % 50) + 1;
                let link = (!anchors.is_empty())
                    .then(|| anchors[id as usize % anchors.len()]);
                let event = match (choice, link) {
                    (0, _) => {
                        anchors.push(id);
                        EnhancedHistoryEvent {
                            activity_id: Some(format!("a{id}")),
                            ..ev(id, "ActivityTaskScheduled", minute)
                        }
                    }
                    (1, Some(target)) => EnhancedHistoryEvent {
                        scheduled_event_id: Some(target),
                        ..ev(id, "ActivityTaskStarted", minute)
                    },
                    (2, Some(target)) => EnhancedHistoryEvent {
                        scheduled_event_id: Some(target),
                        ..ev(id, "ActivityTaskCompleted", minute)
                    },
                    (3, Some(target)) => EnhancedHistoryEvent {
                        scheduled_event_id: Some(target),
                        ..ev(id, "ActivityTaskFailed", minute)
                    },
                    (4, _) => {
                        anchors.push(id);
                        EnhancedHistoryEvent {
                            timer_id: Some(format!("t{id}")),
                            ..ev(id, "TimerStarted", minute)
                        }
                    }
                    _ => ev(id, "WorkflowExecutionSignaled", minute),
                };
                events.push(event);
            }
            events
        }

        proptest! {
            /// Every event lands in exactly one node, parent/child links
            /// agree, and the attempts counter equals the number of
            /// ActivityTaskStarted events folded into the node.
            #[test]
            fn tree_partitions_events(choices in proptest::collection::vec(0u8..6, 0..60)) {
                let events = events_from(&choices);
                let tree = build_event_tree(&events);

                let placed: usize = tree.nodes.iter().map(|n| n.events.len()).sum();
                prop_assert_eq!(placed, events.len());

                for (idx, node) in tree.nodes.iter().enumerate() {
                    for &child in &node.children {
                        prop_assert_eq!(tree.nodes[child].parent, Some(idx));
                    }
                    match node.parent {
                        Some(parent) => prop_assert!(tree.nodes[parent].children.contains(&idx)),
                        None => prop_assert!(tree.roots.contains(&idx)),
                    }

                    let started = node
                        .events
                        .iter()
                        .filter(|e| e.event_type == "ActivityTaskStarted")
                        .count() as u32;
                    prop_assert_eq!(node.attempts, started);
                }
            }
        }
    }

    #[test]
    fn events_without_workflow_start_are_roots() {
        let events = vec![
            EnhancedHistoryEvent {
                activity_type: Some("Orphan".to_string()),
                ..ev(5, "ActivityTaskScheduled", 0)
            },
            EnhancedHistoryEvent {
                scheduled_event_id: Some(5),
                ..ev(6, "ActivityTaskStarted", 1)
            },
        ];
        let tree = build_event_tree(&events);
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.nodes[tree.roots[0]].name, "ActivityTask(Orphan)");
        assert_eq!(tree.nodes[tree.roots[0]].status, NodeStatus::Running);
    }
}
