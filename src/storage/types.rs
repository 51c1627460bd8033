//! Shared types for storage operations

use serde::Serialize;

use crate::domain::EventId;

/// A stored value with the version it was written at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Versioned<T> {
    pub value: T,
    /// 1 on first save, incremented on every overwrite
    pub version: u64,
}

/// Outcome of waiting on the analysis queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    Ready(EventId),
    /// The caller's cancellation signal fired first
    Cancelled,
    /// The queue was closed and fully drained
    Closed,
}

impl Dequeued {
    pub fn into_id(self) -> Option<EventId> {
        match self {
            Self::Ready(id) => Some(id),
            Self::Cancelled | Self::Closed => None,
        }
    }
}
