//! Weft TUI - interaction and state-management engine.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod filter;
pub mod modals;
pub mod nav;
pub mod screen;
pub mod screens;
pub mod supervisor;
pub mod theme;
pub mod widgets;
