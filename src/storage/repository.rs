//! Error repository combining the event store and the analysis queue
//!
//! This is the façade the ingest path and the analysis worker share:
//! producers `save` then `enqueue_for_analysis`, the single worker
//! `dequeue_for_analysis`, reads the event and writes its new state back.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backends::{ChannelQueue, MemoryEventStore};
use super::config::{QueueConfig, StorageConfig};
use super::error::StorageResult;
use super::traits::{AnalysisQueue, EventStore};
use super::types::{Dequeued, Versioned};
use crate::domain::{ErrorEvent, EventId};

/// Composite repository over an [`EventStore`] and an [`AnalysisQueue`]
///
/// Only one task may consume from the queue at a time. Concurrent
/// dequeuers are serialized by the queue, but FIFO delivery is only
/// meaningful to a single worker.
#[derive(Clone)]
pub struct ErrorRepository {
    store: Arc<dyn EventStore>,
    queue: Arc<dyn AnalysisQueue>,
}

impl ErrorRepository {
    pub fn new(store: Arc<dyn EventStore>, queue: Arc<dyn AnalysisQueue>) -> Self {
        Self { store, queue }
    }

    /// Default in-memory repository with an unbounded queue
    pub fn in_memory() -> StorageResult<Self> {
        Self::from_config(&StorageConfig::default(), &QueueConfig::default())
    }

    pub fn from_config(storage: &StorageConfig, queue: &QueueConfig) -> StorageResult<Self> {
        let store = MemoryEventStore::new(storage)?;
        let queue = ChannelQueue::new(queue)?;
        debug!(
            "Created in-memory repository with {} shards, queue capacity {:?}",
            store.shard_count(),
            queue.config().capacity
        );
        Ok(Self::new(Arc::new(store), Arc::new(queue)))
    }

    /// Store the event and return its id
    pub async fn save(
        &self,
        event: &ErrorEvent,
        cancel: &CancellationToken,
    ) -> StorageResult<EventId> {
        self.store.save(event, cancel).await
    }

    pub async fn get_by_id(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<ErrorEvent>> {
        self.store.get_by_id(id, cancel).await
    }

    pub async fn get_versioned(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Versioned<ErrorEvent>>> {
        self.store.get_versioned(id, cancel).await
    }

    /// Overwrite the stored record; concurrent updates race, last write wins
    pub async fn update(&self, event: &ErrorEvent, cancel: &CancellationToken) -> StorageResult<()> {
        self.store.update(event, cancel).await
    }

    /// Overwrite the stored record if nobody wrote it since `expected_version`
    pub async fn update_if_version(
        &self,
        event: &ErrorEvent,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> StorageResult<u64> {
        self.store
            .update_if_version(event, expected_version, cancel)
            .await
    }

    /// Make a saved event visible to the analysis worker
    pub async fn enqueue_for_analysis(
        &self,
        id: EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.queue.enqueue(id, cancel).await
    }

    /// Wait for the next id; `None` on cancellation or once closed and drained
    pub async fn dequeue_for_analysis(&self, cancel: &CancellationToken) -> Option<EventId> {
        self.queue.dequeue(cancel).await.into_id()
    }

    /// Like [`dequeue_for_analysis`](Self::dequeue_for_analysis) but says why nothing came back
    pub async fn next_for_analysis(&self, cancel: &CancellationToken) -> Dequeued {
        self.queue.dequeue(cancel).await
    }

    /// Shut the queue; the worker drains what is buffered and then stops
    pub fn close_queue(&self) {
        self.queue.close();
    }

    pub fn is_queue_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn pending_analysis(&self) -> usize {
        self.queue.pending()
    }

    pub async fn stored_events(&self, cancel: &CancellationToken) -> StorageResult<usize> {
        self.store.len(cancel).await
    }
}
