//! Top stats bar: namespace, connection status, aggregate counts.

use crate::events::ConnectionStatus;
use crate::theme::theme;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowStats {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub queues: usize,
}

pub struct StatsBar<'a> {
    pub namespace: &'a str,
    pub status: ConnectionStatus,
    pub stats: WorkflowStats,
}

impl<'a> StatsBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let t = theme();
        let (icon, label, color) = match self.status {
            ConnectionStatus::Connected => ("●", "connected", t.completed),
            ConnectionStatus::Disconnected => ("○", "disconnected", t.failed),
            ConnectionStatus::Reconnecting => ("◌", "reconnecting", t.warning),
        };

        let line = Line::from(vec![
            Span::styled(self.namespace, Style::default().fg(t.text)),
            Span::styled(" • ", Style::default().fg(t.text_dim)),
            Span::styled(format!("{icon} {label}"), Style::default().fg(color)),
            Span::styled("   Running: ", Style::default().fg(t.text_dim)),
            Span::styled(self.stats.running.to_string(), Style::default().fg(t.running)),
            Span::styled("  Completed: ", Style::default().fg(t.text_dim)),
            Span::styled(self.stats.completed.to_string(), Style::default().fg(t.completed)),
            Span::styled("  Failed: ", Style::default().fg(t.text_dim)),
            Span::styled(self.stats.failed.to_string(), Style::default().fg(t.failed)),
            Span::styled("  Queues: ", Style::default().fg(t.text_dim)),
            Span::styled(self.stats.queues.to_string(), Style::default().fg(t.accent)),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(t.border))
            .title(Span::styled(
                " weft ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ));
        f.render_widget(Paragraph::new(line).block(block), area);
    }
}
