//! Error types for repository operations.

use crate::models::GameId;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The store is unavailable. Typically transient.
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// Requested record was not found.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// A record was rejected before being stored.
    #[error("Data validation error: {message} [game={game}]")]
    ValidationError { message: String, game: String },

    /// Reading a record file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record file could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a validation error for a record (unassigned ids render as `new`).
    pub fn validation(message: impl Into<String>, game: Option<GameId>) -> Self {
        Self::ValidationError {
            message: message.into(),
            game: game.map_or_else(|| "new".to_string(), |id| id.to_string()),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }
}
