//! Collapsible event-tree widget.

use crate::theme::{node_status_color, theme};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;
use std::collections::HashSet;
use weft_core::{format_duration, EventTree};

/// Depth-first order of the nodes currently visible given the expansion
/// set. Indices refer into `tree.nodes`.
pub fn visible_nodes(tree: &EventTree, expanded: &HashSet<usize>) -> Vec<usize> {
    let mut out = Vec::with_capacity(tree.nodes.len());
    for &root in &tree.roots {
        walk(tree, root, expanded, &mut out);
    }
    out
}

fn walk(tree: &EventTree, idx: usize, expanded: &HashSet<usize>, out: &mut Vec<usize>) {
    out.push(idx);
    if expanded.contains(&idx) {
        for &child in &tree.nodes[idx].children {
            walk(tree, child, expanded, out);
        }
    }
}

fn depth_of(tree: &EventTree, idx: usize) -> usize {
    let mut depth = 0;
    let mut current = tree.nodes[idx].parent;
    while let Some(p) = current {
        depth += 1;
        current = tree.nodes[p].parent;
    }
    depth
}

pub struct EventTreeWidget<'a> {
    pub title: &'a str,
    pub tree: &'a EventTree,
    pub expanded: &'a HashSet<usize>,
    /// Position within [`visible_nodes`] order.
    pub selected: Option<usize>,
    pub focused: bool,
}

impl<'a> EventTreeWidget<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let order = visible_nodes(self.tree, self.expanded);

        let items: Vec<ListItem> = order
            .iter()
            .map(|&idx| {
                let node = &self.tree.nodes[idx];
                let indent = "  ".repeat(depth_of(self.tree, idx));
                let marker = if node.children.is_empty() {
                    "  "
                } else if self.expanded.contains(&idx) {
                    "▾ "
                } else {
                    "▸ "
                };
                let mut spans = vec![
                    Span::raw(indent),
                    Span::styled(marker.to_string(), Style::default().fg(t.text_dim)),
                    Span::styled(
                        node.name.clone(),
                        Style::default().fg(node_status_color(node.status, &t)),
                    ),
                    Span::styled(
                        format!(" [{}]", node.status),
                        Style::default().fg(t.text_dim),
                    ),
                ];
                if node.attempts > 1 {
                    spans.push(Span::styled(
                        format!(" ×{}", node.attempts),
                        Style::default().fg(t.warning),
                    ));
                }
                if let Some(duration) = node.duration() {
                    spans.push(Span::styled(
                        format!(" {}", format_duration(duration)),
                        Style::default().fg(t.text_dim),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let border = if self.focused { t.border_focus } else { t.border };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(
                Style::default().bg(t.bg_alt).add_modifier(Modifier::BOLD),
            );

        let mut state = ListState::default();
        state.select(self.selected);
        f.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{build_event_tree, EnhancedHistoryEvent};

    fn ev(id: i64, event_type: &str) -> EnhancedHistoryEvent {
        EnhancedHistoryEvent {
            id,
            event_type: event_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn collapsed_tree_shows_only_roots() {
        let events = vec![
            ev(1, "WorkflowExecutionStarted"),
            ev(2, "ActivityTaskScheduled"),
        ];
        let tree = build_event_tree(&events);
        let collapsed = visible_nodes(&tree, &HashSet::new());
        assert_eq!(collapsed.len(), 1);

        let mut expanded = HashSet::new();
        expanded.insert(tree.roots[0]);
        assert_eq!(visible_nodes(&tree, &expanded).len(), 2);
    }
}
