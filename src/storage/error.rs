//! Error types for the event store and analysis queue

use std::fmt;
use thiserror::Error;

use crate::domain::EventId;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The caller's cancellation signal fired before the operation took effect
    #[error("Operation cancelled")]
    Cancelled,

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-swap update lost against a concurrent writer
    #[error("Conflict on event {id}: expected version {expected}, found {actual}")]
    Conflict {
        id: EventId,
        expected: u64,
        actual: u64,
    },

    /// The queue was shut down and accepts no more work
    #[error("Analysis queue is closed")]
    QueueClosed,

    /// Bounded queue at capacity under the reject policy
    #[error("Analysis queue is full (capacity {0})")]
    QueueFull(usize),

    /// Backend could not serve the request right now
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found<E: fmt::Display>(item: E) -> Self {
        Self::NotFound(item.to_string())
    }

    /// Create a configuration error
    pub fn configuration<E: fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::QueueFull(_) | Self::Unavailable(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification_helpers() {
        let conflict = StorageError::Conflict {
            id: EventId::from("a"),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_conflict());
        assert!(conflict.is_retryable());
        assert!(!StorageError::QueueClosed.is_retryable());
        assert!(StorageError::not_found("x").is_not_found());
        assert!(StorageError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StorageError::QueueFull(8).to_string(),
            "Analysis queue is full (capacity 8)"
        );
        assert_eq!(
            StorageError::configuration("shards must be > 0").to_string(),
            "Configuration error: shards must be > 0"
        );
    }
}
