//! Core trait definitions for the event store and analysis queue

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::StorageResult;
use super::types::{Dequeued, Versioned};
use crate::domain::{ErrorEvent, EventId};

/// Keyed storage of error events
///
/// Records are replaced as a whole; readers receive owned snapshots.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert or overwrite the record keyed by the event id
    async fn save(&self, event: &ErrorEvent, cancel: &CancellationToken)
        -> StorageResult<EventId>;

    /// Load a snapshot of an event, `None` when unknown
    async fn get_by_id(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<ErrorEvent>>;

    /// Load a snapshot together with its stored version
    async fn get_versioned(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Versioned<ErrorEvent>>>;

    /// Overwrite the record, last write wins
    async fn update(&self, event: &ErrorEvent, cancel: &CancellationToken) -> StorageResult<()>;

    /// Overwrite the record only if its stored version still matches
    async fn update_if_version(
        &self,
        event: &ErrorEvent,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> StorageResult<u64>;

    /// Number of stored records
    async fn len(&self, cancel: &CancellationToken) -> StorageResult<usize>;
}

/// Multi-producer, single-consumer queue of event ids awaiting analysis
#[async_trait]
pub trait AnalysisQueue: Send + Sync {
    /// Publish an id to the consumer
    async fn enqueue(&self, id: EventId, cancel: &CancellationToken) -> StorageResult<()>;

    /// Wait for the next id, cancellation, or close
    async fn dequeue(&self, cancel: &CancellationToken) -> Dequeued;

    /// Stop accepting ids; buffered ids are still delivered
    fn close(&self);

    fn is_closed(&self) -> bool;

    /// Approximate number of queued ids
    fn pending(&self) -> usize;
}
