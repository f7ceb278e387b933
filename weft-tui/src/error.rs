//! Error types for the TUI.

use crate::config::ConfigError;
use crate::theme::ThemeError;
use weft_provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
