//! Process-wide theme registry.
//!
//! The active palette lives behind a read-write lock holding an `Arc`;
//! draws clone the `Arc` (a pointer copy), a theme switch swaps it (one
//! allocation per change). Components read colors at draw time rather than
//! caching them, so a switch takes effect on the next frame with no
//! notification machinery.

use ratatui::style::Color;
use std::sync::{Arc, OnceLock, RwLock};
use weft_core::{NamespaceState, NodeStatus, WorkflowStatus};

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("unknown theme: {0}")]
    Unknown(String),
}

/// A palette. Hex values are parsed once at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub bg_alt: Color,
    pub text: Color,
    pub text_dim: Color,
    pub accent: Color,
    pub accent_alt: Color,
    pub border: Color,
    pub border_focus: Color,
    pub running: Color,
    pub completed: Color,
    pub failed: Color,
    pub canceled: Color,
    pub pending: Color,
    pub warning: Color,
}

fn hex(rgb: u32) -> Color {
    Color::Rgb(
        ((rgb >> 16) & 0xff) as u8,
        ((rgb >> 8) & 0xff) as u8,
        (rgb & 0xff) as u8,
    )
}

fn synthwave() -> Theme {
    Theme {
        name: "synthwave",
        bg: hex(0x0b0b12),
        bg_alt: hex(0x1a1a26),
        text: hex(0xf2f2f7),
        text_dim: hex(0x8a8a9e),
        accent: hex(0x00e5ff),
        accent_alt: hex(0xff2ec4),
        border: hex(0x3a3a52),
        border_focus: hex(0x00e5ff),
        running: hex(0x00e5ff),
        completed: hex(0x39ff88),
        failed: hex(0xff4d6d),
        canceled: hex(0xd0a030),
        pending: hex(0x8a8a9e),
        warning: hex(0xffd23f),
    }
}

fn midnight() -> Theme {
    Theme {
        name: "midnight",
        bg: hex(0x10141f),
        bg_alt: hex(0x1b2233),
        text: hex(0xdde4f0),
        text_dim: hex(0x6f7d99),
        accent: hex(0x6ea8fe),
        accent_alt: hex(0xb197fc),
        border: hex(0x2b3550),
        border_focus: hex(0x6ea8fe),
        running: hex(0x6ea8fe),
        completed: hex(0x63d68b),
        failed: hex(0xe5696f),
        canceled: hex(0xcf9f52),
        pending: hex(0x6f7d99),
        warning: hex(0xe6c45c),
    }
}

fn boreal() -> Theme {
    Theme {
        name: "boreal",
        bg: hex(0x0d1412),
        bg_alt: hex(0x16211d),
        text: hex(0xe6f1ec),
        text_dim: hex(0x7e9489),
        accent: hex(0x4fd6a7),
        accent_alt: hex(0x7cc7ff),
        border: hex(0x27382f),
        border_focus: hex(0x4fd6a7),
        running: hex(0x7cc7ff),
        completed: hex(0x4fd6a7),
        failed: hex(0xf07a7a),
        canceled: hex(0xd8b05f),
        pending: hex(0x7e9489),
        warning: hex(0xe8cb6a),
    }
}

fn paper() -> Theme {
    Theme {
        name: "paper",
        bg: hex(0xf7f4ed),
        bg_alt: hex(0xece7db),
        text: hex(0x2c2a26),
        text_dim: hex(0x7c766a),
        accent: hex(0x1f6feb),
        accent_alt: hex(0x8250df),
        border: hex(0xc9c2b2),
        border_focus: hex(0x1f6feb),
        running: hex(0x1f6feb),
        completed: hex(0x1a7f37),
        failed: hex(0xcf222e),
        canceled: hex(0x9a6700),
        pending: hex(0x7c766a),
        warning: hex(0x9a6700),
    }
}

fn builtin(name: &str) -> Option<Theme> {
    match name.trim().to_ascii_lowercase().as_str() {
        "synthwave" => Some(synthwave()),
        "midnight" => Some(midnight()),
        "boreal" => Some(boreal()),
        "paper" => Some(paper()),
        _ => None,
    }
}

/// Names of the built-in palettes, selector order.
pub fn theme_names() -> &'static [&'static str] {
    &["synthwave", "midnight", "boreal", "paper"]
}

fn registry() -> &'static RwLock<Arc<Theme>> {
    static ACTIVE: OnceLock<RwLock<Arc<Theme>>> = OnceLock::new();
    ACTIVE.get_or_init(|| RwLock::new(Arc::new(synthwave())))
}

/// Installs the named palette. Must succeed before the first screen is
/// built; an unknown name at startup is fatal to the caller.
pub fn init_theme(name: &str) -> Result<(), ThemeError> {
    set_theme(name)
}

/// Swaps the active palette atomically. On an unknown name the previous
/// palette stays intact.
pub fn set_theme(name: &str) -> Result<(), ThemeError> {
    let theme = builtin(name).ok_or_else(|| ThemeError::Unknown(name.to_string()))?;
    let mut active = registry().write().unwrap_or_else(|e| e.into_inner());
    *active = Arc::new(theme);
    Ok(())
}

/// The active palette. Read at draw time, never cached across frames.
pub fn theme() -> Arc<Theme> {
    registry().read().unwrap_or_else(|e| e.into_inner()).clone()
}

pub fn status_color(status: WorkflowStatus, theme: &Theme) -> Color {
    match status {
        WorkflowStatus::Running => theme.running,
        WorkflowStatus::Completed => theme.completed,
        WorkflowStatus::Failed => theme.failed,
        WorkflowStatus::Canceled | WorkflowStatus::Terminated => theme.canceled,
        WorkflowStatus::TimedOut => theme.warning,
        WorkflowStatus::Unknown => theme.text_dim,
    }
}

pub fn status_icon(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Running => "●",
        WorkflowStatus::Completed => "✓",
        WorkflowStatus::Failed => "✗",
        WorkflowStatus::Canceled => "⊘",
        WorkflowStatus::Terminated => "■",
        WorkflowStatus::TimedOut => "◷",
        WorkflowStatus::Unknown => "?",
    }
}

pub fn node_status_color(status: NodeStatus, theme: &Theme) -> Color {
    match status {
        NodeStatus::Pending => theme.pending,
        NodeStatus::Running => theme.running,
        NodeStatus::Completed => theme.completed,
        NodeStatus::Failed => theme.failed,
        NodeStatus::Canceled => theme.canceled,
        NodeStatus::TimedOut => theme.warning,
    }
}

pub fn namespace_state_color(state: NamespaceState, theme: &Theme) -> Color {
    match state {
        NamespaceState::Active => theme.completed,
        NamespaceState::Deprecated => theme.warning,
        NamespaceState::Deleted => theme.failed,
        NamespaceState::Unknown => theme.text_dim,
    }
}

/// Color for an event type in the history list, keyed on its suffix.
pub fn event_type_color(event_type: &str, theme: &Theme) -> Color {
    if event_type.ends_with("Failed") || event_type.ends_with("TimedOut") {
        theme.failed
    } else if event_type.ends_with("Completed") || event_type.ends_with("Fired") {
        theme.completed
    } else if event_type.ends_with("Started") {
        theme.running
    } else if event_type.ends_with("Scheduled") {
        theme.text_dim
    } else {
        theme.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns the global registry; parallel tests over shared
    // process state would race each other.
    #[test]
    fn swap_and_failed_swap_behave_atomically() {
        set_theme("midnight").unwrap();
        let active = theme();
        assert_eq!(active.name, "midnight");
        assert_eq!(active.accent, hex(0x6ea8fe));

        let err = set_theme("neon-goblin").unwrap_err();
        assert!(matches!(err, ThemeError::Unknown(_)));
        assert_eq!(theme().name, "midnight");

        set_theme("synthwave").unwrap();
        assert_eq!(theme().name, "synthwave");
    }

    #[test]
    fn every_listed_theme_loads() {
        for name in theme_names() {
            assert!(builtin(name).is_some(), "{name} must parse");
        }
    }
}
