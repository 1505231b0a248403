//! Error types for the statistics engine.
//!
//! Empty samples are never an error: every builder returns a zero-filled
//! result instead. The variants here cover bad caller input, models that
//! cannot be evaluated within their budget, and broken internal invariants.

use std::fmt;

use crate::db::repository::RepositoryError;

/// Result type for engine operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Structured context describing where an engine error was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The component that raised the error (e.g., "duration_histogram")
    pub component: Option<String>,
    /// The outcome being computed, if any (e.g., "sips")
    pub outcome: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context for a component.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            ..Default::default()
        }
    }

    /// Set the outcome name.
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref component) = self.component {
            parts.push(format!("component={}", component));
        }
        if let Some(ref outcome) = self.outcome {
            parts.push(format!("outcome={}", outcome));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for report generation.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Malformed or out-of-range season / player-count selector.
    /// Surfaced to the caller as-is, never retried.
    #[error("Invalid selector: {message}")]
    InvalidSelector { message: String },

    /// The generative model could not be evaluated exactly nor within the
    /// simulation budget. Fatal to one report only.
    #[error("Intractable model: {message} {context}")]
    IntractableModel {
        message: String,
        context: ErrorContext,
    },

    /// A construction-time invariant did not hold (probability mass not
    /// summing to one, row percentages off, negative durations).
    #[error("Internal consistency fault: {message} {context}")]
    InternalConsistency {
        message: String,
        context: ErrorContext,
    },

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage collaborator failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A sub-builder task panicked or was cancelled.
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl StatsError {
    /// Create an invalid selector error.
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            message: message.into(),
        }
    }

    /// Create an intractable model error with context.
    pub fn intractable(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::IntractableModel {
            message: message.into(),
            context,
        }
    }

    /// Create an internal consistency error with context.
    pub fn consistency(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalConsistency {
            message: message.into(),
            context,
        }
    }

    /// Whether the error was caused by caller input rather than the engine.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidSelector { .. })
    }
}

impl From<tokio::task::JoinError> for StatsError {
    fn from(err: tokio::task::JoinError) -> Self {
        StatsError::TaskJoin(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new("duration_histogram")
            .with_outcome("chug_duration")
            .with_details("value=-1");
        assert_eq!(
            ctx.to_string(),
            "[component=duration_histogram, outcome=chug_duration, details=value=-1]"
        );
    }

    #[test]
    fn test_error_context_empty() {
        assert_eq!(ErrorContext::default().to_string(), "[]");
    }

    #[test]
    fn test_invalid_selector_message() {
        let err = StatsError::invalid_selector("player count 9 outside 2..=6");
        assert!(err.is_caller_error());
        assert_eq!(
            err.to_string(),
            "Invalid selector: player count 9 outside 2..=6"
        );
    }

    #[test]
    fn test_consistency_is_not_caller_error() {
        let err = StatsError::consistency("sum drifted", ErrorContext::new("theory"));
        assert!(!err.is_caller_error());
        assert!(err.to_string().contains("component=theory"));
    }
}
