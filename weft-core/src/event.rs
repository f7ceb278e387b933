//! Workflow history events.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A typed record appended to a run's history. Event ids are dense
/// monotonic integers within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: i64,
    pub event_type: String,
    pub time: Timestamp,
    /// Comma-separated `Key: value` summary for display.
    pub details: String,
}

/// Superset of [`HistoryEvent`] with the typed fields needed for tree and
/// timeline construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnhancedHistoryEvent {
    pub id: i64,
    pub event_type: String,
    #[serde(default = "default_time")]
    pub time: Timestamp,
    pub details: String,
    pub scheduled_event_id: Option<i64>,
    pub started_event_id: Option<i64>,
    pub attempt: Option<u32>,
    pub activity_type: Option<String>,
    pub activity_id: Option<String>,
    pub timer_id: Option<String>,
    pub task_queue: Option<String>,
    pub identity: Option<String>,
    pub failure: Option<String>,
    pub result: Option<String>,
}

fn default_time() -> Timestamp {
    chrono::DateTime::<chrono::Utc>::UNIX_EPOCH
}

impl EnhancedHistoryEvent {
    /// Projects the enhanced event down to the basic record used by the
    /// flat list view.
    pub fn basic(&self) -> HistoryEvent {
        HistoryEvent {
            id: self.id,
            event_type: self.event_type.clone(),
            time: self.time,
            details: self.details.clone(),
        }
    }

    /// The event id this event links back to, if any. Scheduled wins over
    /// started when both are present.
    pub fn parent_link(&self) -> Option<i64> {
        self.scheduled_event_id.or(self.started_event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn basic_projection_keeps_identity_fields() {
        let enhanced = EnhancedHistoryEvent {
            id: 5,
            event_type: "ActivityTaskScheduled".to_string(),
            time: Utc::now(),
            details: "ActivityType: ValidateOrder".to_string(),
            activity_type: Some("ValidateOrder".to_string()),
            ..Default::default()
        };
        let basic = enhanced.basic();
        assert_eq!(basic.id, 5);
        assert_eq!(basic.event_type, "ActivityTaskScheduled");
        assert_eq!(basic.details, "ActivityType: ValidateOrder");
    }

    #[test]
    fn parent_link_prefers_scheduled() {
        let event = EnhancedHistoryEvent {
            id: 7,
            scheduled_event_id: Some(5),
            started_event_id: Some(6),
            ..Default::default()
        };
        assert_eq!(event.parent_link(), Some(5));

        let started_only = EnhancedHistoryEvent {
            id: 14,
            started_event_id: Some(13),
            ..Default::default()
        };
        assert_eq!(started_only.parent_link(), Some(13));
    }
}
