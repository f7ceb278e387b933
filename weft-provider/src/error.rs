//! Error taxonomy for provider operations.

use thiserror::Error;

/// Typed failure of a provider operation. Kinds, not transports: every
/// backend maps its native failures onto these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Dial failed, probe failed, or a deadline expired on the transport.
    #[error("connection error: {reason}")]
    Connection { reason: String },

    #[error("not found: {entity}")]
    NotFound { entity: String },

    /// Malformed visibility expression, bad JSON input, unknown query
    /// handler, and similar caller mistakes.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Surfaced from the service verbatim.
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Mutation not permitted in the entity's current state.
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ProviderError {
    pub fn connection(reason: impl Into<String>) -> Self {
        ProviderError::Connection { reason: reason.into() }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        ProviderError::NotFound { entity: entity.into() }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        ProviderError::InvalidRequest { reason: reason.into() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        ProviderError::Conflict { reason: reason.into() }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        ProviderError::Internal { reason: reason.into() }
    }

    /// True for failures that should flip the connection supervisor to
    /// Disconnected rather than surface in a screen.
    pub fn is_connection(&self) -> bool {
        matches!(self, ProviderError::Connection { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
