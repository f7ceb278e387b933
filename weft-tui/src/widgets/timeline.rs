//! Timeline view: proportional bars over a zoomable time axis.
//!
//! The zoom factor is a power of two clamped to [1, 512]; with a maximum
//! factor of 512, ten zoom-out presses reach the full range from any
//! state. Scrolling moves the window by an eighth of its width.

use crate::theme::{node_status_color, theme};
use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use weft_core::{truncate, EventTree, Timestamp};

pub const MIN_ZOOM: u32 = 1;
pub const MAX_ZOOM: u32 = 512;
const LABEL_WIDTH: usize = 24;

pub fn zoom_in(zoom: u32) -> u32 {
    (zoom.saturating_mul(2)).min(MAX_ZOOM)
}

pub fn zoom_out(zoom: u32) -> u32 {
    (zoom / 2).max(MIN_ZOOM)
}

/// Scroll offset is a fraction of the scrollable headroom in [0, 1].
pub fn scroll(offset: f64, direction: i8) -> f64 {
    (offset + f64::from(direction) * 0.125).clamp(0.0, 1.0)
}

pub struct TimelineWidget<'a> {
    pub title: &'a str,
    pub tree: &'a EventTree,
    pub zoom: u32,
    pub offset: f64,
    /// Index into `tree.nodes`.
    pub selected: Option<usize>,
}

impl<'a> TimelineWidget<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border));

        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_width = inner_width.saturating_sub(LABEL_WIDTH + 1);
        if self.tree.is_empty() || bar_width < 4 {
            f.render_widget(
                Paragraph::new("no events").block(block).style(Style::default().fg(t.text_dim)),
                area,
            );
            return;
        }

        let now = Utc::now();
        let (range_start, range_end) = time_range(self.tree, now);
        let full_secs = (range_end - range_start).num_milliseconds().max(1) as f64;
        let window_secs = full_secs / f64::from(self.zoom.max(1));
        let headroom = full_secs - window_secs;
        let window_start = range_start.timestamp_millis() as f64 + headroom * self.offset;
        let window_end = window_start + window_secs;

        let lines: Vec<Line> = self
            .tree
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let label = format!(
                    "{:<LABEL_WIDTH$}",
                    truncate(&node.name, LABEL_WIDTH)
                );
                let start = node.start_time.timestamp_millis() as f64;
                let end = node
                    .end_time
                    .unwrap_or(now)
                    .timestamp_millis() as f64;

                let from = ((start - window_start) / (window_end - window_start)
                    * bar_width as f64)
                    .floor();
                let to = ((end - window_start) / (window_end - window_start)
                    * bar_width as f64)
                    .ceil();
                let from = from.clamp(0.0, bar_width as f64) as usize;
                let to = to.clamp(0.0, bar_width as f64) as usize;

                let in_window = end >= window_start && start <= window_end;
                let len = if to > from {
                    to - from
                } else if in_window {
                    1
                } else {
                    0
                };
                let len = len.min(bar_width.saturating_sub(from));

                let mut bar = String::with_capacity(bar_width);
                bar.extend(std::iter::repeat(' ').take(from));
                bar.extend(std::iter::repeat('█').take(len));

                let mut label_style = Style::default().fg(t.text);
                if self.selected == Some(idx) {
                    label_style = label_style.bg(t.bg_alt).add_modifier(Modifier::BOLD);
                }
                Line::from(vec![
                    Span::styled(label, label_style),
                    Span::raw(" "),
                    Span::styled(bar, Style::default().fg(node_status_color(node.status, &t))),
                ])
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn time_range(tree: &EventTree, now: Timestamp) -> (Timestamp, Timestamp) {
    let mut start = now;
    let mut end = now;
    let mut any_open = false;
    for node in &tree.nodes {
        start = start.min(node.start_time);
        match node.end_time {
            Some(t) => end = end.max(t),
            None => any_open = true,
        }
    }
    if !any_open {
        // All nodes closed; clamp the range to the data.
        end = tree
            .nodes
            .iter()
            .filter_map(|n| n.end_time)
            .max()
            .unwrap_or(now);
    }
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_zoom_out_presses_reach_full_range() {
        let mut zoom = MAX_ZOOM;
        for _ in 0..10 {
            zoom = zoom_out(zoom);
        }
        assert_eq!(zoom, MIN_ZOOM);
    }

    #[test]
    fn zoom_clamps_at_both_ends() {
        assert_eq!(zoom_in(MAX_ZOOM), MAX_ZOOM);
        assert_eq!(zoom_out(MIN_ZOOM), MIN_ZOOM);
        assert_eq!(zoom_in(1), 2);
        assert_eq!(zoom_out(8), 4);
    }

    #[test]
    fn scroll_stays_in_unit_interval() {
        assert_eq!(scroll(0.0, -1), 0.0);
        assert_eq!(scroll(1.0, 1), 1.0);
        let mid = scroll(0.5, 1);
        assert!(mid > 0.5 && mid <= 1.0);
    }
}
