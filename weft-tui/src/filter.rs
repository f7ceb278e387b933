//! Filter and query state for list screens: the client-side substring
//! filter, the visibility-expression helpers (history, autocomplete
//! suggestions, templates, date ranges, time placeholders).

use chrono::{Duration, SecondsFormat};
use std::collections::VecDeque;
use weft_core::{Timestamp, Workflow};

pub const MAX_HISTORY: usize = 50;

// ============================================================================
// SUBSTRING FILTER
// ============================================================================

/// Case-insensitive match across id, type and status.
pub fn matches_filter(workflow: &Workflow, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    workflow.id.to_lowercase().contains(&needle)
        || workflow.workflow_type.to_lowercase().contains(&needle)
        || workflow.status.to_string().to_lowercase().contains(&needle)
}

// ============================================================================
// SEARCH HISTORY
// ============================================================================

/// Bounded deque of prior visibility expressions, most-recent-last.
/// No two adjacent entries are equal; re-inserting an existing entry
/// removes the prior occurrence before appending.
#[derive(Debug, Clone, Default)]
pub struct SearchHistory {
    entries: VecDeque<String>,
    cursor: Option<usize>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, query: &str) {
        self.cursor = None;
        if query.is_empty() {
            return;
        }
        if self.entries.back().map(|s| s.as_str()) == Some(query) {
            return;
        }
        if let Some(pos) = self.entries.iter().position(|s| s == query) {
            self.entries.remove(pos);
        }
        self.entries.push_back(query.to_string());
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
    }

    /// Step back towards older entries. Stays on the oldest once reached.
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.cursor {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(next);
        self.entries.get(next).map(|s| s.as_str())
    }

    /// Step forward towards newer entries. Walking past the newest ends
    /// the browse and yields the empty string.
    pub fn next(&mut self) -> Option<String> {
        let cursor = self.cursor?;
        if cursor + 1 < self.entries.len() {
            self.cursor = Some(cursor + 1);
            self.entries.get(cursor + 1).cloned()
        } else {
            self.cursor = None;
            Some(String::new())
        }
    }

    pub fn reset_browse(&mut self) {
        self.cursor = None;
    }
}

// ============================================================================
// TIME PLACEHOLDERS
// ============================================================================

/// Replaces `now()` and `now()-<N><m|h|d|w>` with a quoted RFC 3339
/// timestamp. Resolution happens at fetch time, never at composition time.
pub fn resolve_time_placeholders(query: &str, now: Timestamp) -> String {
    let mut out = String::with_capacity(query.len());
    let mut rest = query;
    while let Some(pos) = rest.find("now()") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + "now()".len()..];

        let mut instant = now;
        if let Some(stripped) = rest.strip_prefix('-') {
            let digits: String = stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
            let after = &stripped[digits.len()..];
            if let (Ok(n), Some(unit)) = (digits.parse::<i64>(), after.chars().next()) {
                if let Some(delta) = unit_duration(n, unit) {
                    instant = now - delta;
                    rest = &after[unit.len_utf8()..];
                }
            }
        }
        out.push('\'');
        out.push_str(&instant.to_rfc3339_opts(SecondsFormat::Secs, true));
        out.push('\'');
    }
    out.push_str(rest);
    out
}

fn unit_duration(n: i64, unit: char) -> Option<Duration> {
    match unit {
        'm' => Some(Duration::minutes(n)),
        'h' => Some(Duration::hours(n)),
        'd' => Some(Duration::days(n)),
        'w' => Some(Duration::weeks(n)),
        _ => None,
    }
}

/// Parses the custom date-range input: `Nm`, `Nh`, `Nd` or `Nw`.
pub fn parse_custom_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.len() < 2 {
        return None;
    }
    let (digits, unit) = input.split_at(input.len() - 1);
    let n: i64 = digits.parse().ok()?;
    if n <= 0 {
        return None;
    }
    unit_duration(n, unit.chars().next()?)
}

// ============================================================================
// DATE RANGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangePreset {
    LastHour,
    LastDay,
    Last7Days,
    Last30Days,
    AllTime,
}

pub const DATE_RANGE_PRESETS: &[DateRangePreset] = &[
    DateRangePreset::LastHour,
    DateRangePreset::LastDay,
    DateRangePreset::Last7Days,
    DateRangePreset::Last30Days,
    DateRangePreset::AllTime,
];

impl DateRangePreset {
    pub fn label(&self) -> &'static str {
        match self {
            DateRangePreset::LastHour => "Last hour",
            DateRangePreset::LastDay => "Last 24 hours",
            DateRangePreset::Last7Days => "Last 7 days",
            DateRangePreset::Last30Days => "Last 30 days",
            DateRangePreset::AllTime => "All time",
        }
    }

    /// The clause in placeholder form; `AllTime` clears date constraints.
    pub fn clause(&self) -> Option<String> {
        let span = match self {
            DateRangePreset::LastHour => "1h",
            DateRangePreset::LastDay => "24h",
            DateRangePreset::Last7Days => "7d",
            DateRangePreset::Last30Days => "30d",
            DateRangePreset::AllTime => return None,
        };
        Some(format!("StartTime > now()-{span}"))
    }
}

pub fn custom_date_clause(duration_input: &str) -> Option<String> {
    parse_custom_duration(duration_input)?;
    Some(format!("StartTime > now()-{}", duration_input.trim()))
}

fn constrains_time(clause: &str) -> bool {
    clause.contains("StartTime") || clause.contains("CloseTime")
}

/// AND-combines a date clause into an expression, unless the expression
/// already constrains `StartTime`/`CloseTime` (then the clause replaces
/// the whole expression).
pub fn combine_date_clause(existing: &str, clause: &str) -> String {
    if !existing.is_empty() && !constrains_time(existing) {
        format!("{existing} AND {clause}")
    } else {
        clause.to_string()
    }
}

/// Drops `StartTime`/`CloseTime` conditions from an AND-joined expression.
pub fn clear_date_clauses(query: &str) -> String {
    query
        .split(" AND ")
        .map(str::trim)
        .filter(|part| !part.is_empty() && !constrains_time(part))
        .collect::<Vec<_>>()
        .join(" AND ")
}

// ============================================================================
// QUERY TEMPLATES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub query: &'static str,
}

pub const QUERY_TEMPLATES: &[QueryTemplate] = &[
    QueryTemplate { name: "Running workflows", query: "ExecutionStatus='Running'" },
    QueryTemplate { name: "Failed workflows", query: "ExecutionStatus='Failed'" },
    QueryTemplate {
        name: "Completed in last 24h",
        query: "ExecutionStatus='Completed' AND CloseTime > now()-24h",
    },
    QueryTemplate {
        name: "Long-running (>24h)",
        query: "ExecutionStatus='Running' AND StartTime < now()-24h",
    },
    QueryTemplate { name: "By workflow type", query: "WorkflowType='${type}'" },
    QueryTemplate { name: "By workflow id", query: "WorkflowId='${id}'" },
];

impl QueryTemplate {
    /// Placeholder name, e.g. `${type}` yields `type`.
    pub fn placeholder(&self) -> Option<&'static str> {
        let start = self.query.find("${")?;
        let end = self.query[start..].find('}')? + start;
        Some(&self.query[start + 2..end])
    }

    pub fn fill(&self, value: &str) -> String {
        match self.placeholder() {
            Some(name) => self
                .query
                .replacen(&format!("${{{name}}}"), &format!("'{value}'"), 1),
            None => self.query.to_string(),
        }
    }
}

// ============================================================================
// AUTOCOMPLETE SUGGESTIONS
// ============================================================================

pub const FIELDS: &[&str] = &[
    "ExecutionStatus",
    "WorkflowType",
    "WorkflowId",
    "StartTime",
    "CloseTime",
    "TaskQueue",
];

pub const COMPARISON_OPERATORS: &[&str] = &["=", "!=", ">", "<", "BETWEEN"];

pub const CONNECTIVES: &[&str] = &["AND", "OR", "ORDER BY"];

pub const STATUS_VALUES: &[&str] = &[
    "'Running'",
    "'Completed'",
    "'Failed'",
    "'Canceled'",
    "'Terminated'",
    "'TimedOut'",
];

pub const TIME_VALUES: &[&str] = &["now()", "now()-1h", "now()-24h", "now()-7d", "now()-30d"];

/// Context-aware suggestions for the visibility input, drawn from the
/// closed sets above. The returned strings replace the partial last
/// token. An empty input and a token that already equals a candidate
/// produce no suggestions, which frees Up/Down for history browsing.
pub fn suggest(input: &str) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }
    let normalized = spread_operators(input);
    let ends_complete = input.ends_with(' ');
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
    let partial = if ends_complete { "" } else { tokens.pop().unwrap_or("") };

    let candidates: Vec<&str> = match tokens.last() {
        None => FIELDS.to_vec(),
        Some(&last) => {
            if FIELDS.contains(&last) {
                COMPARISON_OPERATORS.to_vec()
            } else if COMPARISON_OPERATORS.contains(&last) {
                match tokens.iter().rev().nth(1) {
                    Some(&"ExecutionStatus") => STATUS_VALUES.to_vec(),
                    Some(&"StartTime") | Some(&"CloseTime") => TIME_VALUES.to_vec(),
                    _ => Vec::new(),
                }
            } else if last == "AND" || last == "OR" {
                FIELDS.to_vec()
            } else if last == "BY" || last == "ORDER" {
                FIELDS.to_vec()
            } else {
                // A complete value; a connective comes next.
                CONNECTIVES.to_vec()
            }
        }
    };

    let partial_lower = partial.to_lowercase();
    candidates
        .into_iter()
        .filter(|c| partial.is_empty() || c.to_lowercase().starts_with(&partial_lower))
        .filter(|c| !c.eq_ignore_ascii_case(partial))
        .map(str::to_string)
        .collect()
}

/// Surrounds comparison operators with spaces so `Field='x'` tokenizes.
fn spread_operators(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '!' if chars.peek() == Some(&'=') => {
                chars.next();
                out.push_str(" != ");
            }
            '=' | '>' | '<' => {
                out.push(' ');
                out.push(c);
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use weft_core::WorkflowStatus;

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

    #[test]
    fn substring_filter_spans_id_type_status() {
        let workflow = sample_workflow("order-1", "OrderWorkflow", WorkflowStatus::Running);
        assert!(matches_filter(&workflow, "ORDER"));
        assert!(matches_filter(&workflow, "orderwork"));
        assert!(matches_filter(&workflow, "runn"));
        assert!(!matches_filter(&workflow, "payment"));
        assert!(matches_filter(&workflow, ""));
    }

    #[test]
    fn history_navigation_matches_submission_order() {
        let mut history = SearchHistory::new();
        history.add("ExecutionStatus='Running'");
        history.add("WorkflowType='OrderWorkflow'");
        history.add("ExecutionStatus='Failed'");

        assert_eq!(history.previous(), Some("ExecutionStatus='Failed'"));
        assert_eq!(history.previous(), Some("WorkflowType='OrderWorkflow'"));
        assert_eq!(history.previous(), Some("ExecutionStatus='Running'"));
        assert_eq!(history.next().as_deref(), Some("WorkflowType='OrderWorkflow'"));
        assert_eq!(history.next().as_deref(), Some("ExecutionStatus='Failed'"));
        assert_eq!(history.next().as_deref(), Some(""));
        // Browse ended.
        assert_eq!(history.next(), None);
    }

    #[test]
    fn history_previous_floors_at_oldest() {
        let mut history = SearchHistory::new();
        history.add("a");
        history.add("b");
        assert_eq!(history.previous(), Some("b"));
        assert_eq!(history.previous(), Some("a"));
        assert_eq!(history.previous(), Some("a"));
    }

    #[test]
    fn history_reinsert_moves_to_end() {
        let mut history = SearchHistory::new();
        history.add("a");
        history.add("b");
        history.add("c");
        history.add("a");
        let entries: Vec<&str> = history.entries().collect();
        assert_eq!(entries, vec!["b", "c", "a"]);
    }

    #[test]
    fn history_skips_adjacent_duplicates_and_empties() {
        let mut history = SearchHistory::new();
        history.add("a");
        history.add("a");
        history.add("");
        assert_eq!(history.len(), 1);
    }

    proptest! {
        /// Bounded length, no adjacent duplicates, re-insert semantics.
        #[test]
        fn history_invariants(queries in proptest::collection::vec("[a-c]{1,3}", 0..200)) {
            let mut history = SearchHistory::new();
            for q in &queries {
                history.add(q);
            }
            prop_assert!(history.len() <= MAX_HISTORY);
            let entries: Vec<&str> = history.entries().collect();
            for pair in entries.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
            // No entry appears twice at all.
            for (i, a) in entries.iter().enumerate() {
                for b in &entries[i + 1..] {
                    prop_assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn placeholders_resolve_at_given_instant() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let resolved = resolve_time_placeholders("StartTime > now()-24h", now);
        assert_eq!(resolved, "StartTime > '2026-02-28T12:00:00Z'");

        let bare = resolve_time_placeholders("CloseTime < now()", now);
        assert_eq!(bare, "CloseTime < '2026-03-01T12:00:00Z'");

        let untouched = resolve_time_placeholders("ExecutionStatus='Running'", now);
        assert_eq!(untouched, "ExecutionStatus='Running'");
    }

    #[test]
    fn custom_duration_parsing() {
        assert_eq!(parse_custom_duration("45m"), Some(Duration::minutes(45)));
        assert_eq!(parse_custom_duration("3h"), Some(Duration::hours(3)));
        assert_eq!(parse_custom_duration("7d"), Some(Duration::days(7)));
        assert_eq!(parse_custom_duration("2w"), Some(Duration::weeks(2)));
        assert_eq!(parse_custom_duration("0d"), None);
        assert_eq!(parse_custom_duration("abc"), None);
        assert_eq!(parse_custom_duration("5x"), None);
    }

    #[test]
    fn date_clause_combination() {
        let combined = combine_date_clause("ExecutionStatus='Failed'", "StartTime > now()-24h");
        assert_eq!(combined, "ExecutionStatus='Failed' AND StartTime > now()-24h");

        // An expression already constraining time is replaced outright.
        let replaced = combine_date_clause("StartTime > now()-7d", "StartTime > now()-1h");
        assert_eq!(replaced, "StartTime > now()-1h");

        let fresh = combine_date_clause("", "StartTime > now()-1h");
        assert_eq!(fresh, "StartTime > now()-1h");
    }

    #[test]
    fn date_clauses_cleared() {
        let cleared = clear_date_clauses(
            "ExecutionStatus='Failed' AND StartTime > now()-24h AND WorkflowType='X'",
        );
        assert_eq!(cleared, "ExecutionStatus='Failed' AND WorkflowType='X'");
        assert_eq!(clear_date_clauses("StartTime > now()-1h"), "");
    }

    #[test]
    fn templates_expand_placeholders() {
        let by_type = QUERY_TEMPLATES
            .iter()
            .find(|t| t.name == "By workflow type")
            .unwrap();
        assert_eq!(by_type.placeholder(), Some("type"));
        assert_eq!(by_type.fill("OrderWorkflow"), "WorkflowType='OrderWorkflow'");

        let running = QUERY_TEMPLATES[0];
        assert_eq!(running.placeholder(), None);
        assert_eq!(running.fill("ignored"), running.query);
    }

    #[test]
    fn six_templates_exist() {
        assert_eq!(QUERY_TEMPLATES.len(), 6);
    }

    #[test]
    fn suggestions_follow_context() {
        assert!(suggest("Exec").contains(&"ExecutionStatus".to_string()));
        assert!(suggest("ExecutionStatus ").contains(&"=".to_string()));
        assert!(suggest("ExecutionStatus = ").contains(&"'Running'".to_string()));
        assert!(suggest("ExecutionStatus='Ru").contains(&"'Running'".to_string()));
        assert!(suggest("StartTime > ").contains(&"now()-24h".to_string()));
        assert!(suggest("ExecutionStatus='Running' ").contains(&"AND".to_string()));
        assert!(suggest("ExecutionStatus='Running' AND ").contains(&"WorkflowType".to_string()));
    }

    #[test]
    fn no_suggestions_on_empty_or_complete_input() {
        // An empty input and a fully-typed expression leave Up/Down free
        // for history browsing.
        assert!(suggest("").is_empty());
        assert!(suggest("ExecutionStatus='Failed'").is_empty());
    }
}
