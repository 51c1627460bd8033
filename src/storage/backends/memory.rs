//! In-memory sharded event store

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::domain::{ErrorEvent, EventId};
use crate::storage::{
    config::StorageConfig,
    error::{StorageError, StorageResult},
    traits::EventStore,
    types::Versioned,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    event: ErrorEvent,
    version: u64,
}

type Shard = RwLock<HashMap<EventId, StoredRecord>>;

/// In-memory event store split into independently locked shards
///
/// Each record is replaced whole under its shard's write lock, so a reader
/// never sees a half-written event.
pub struct MemoryEventStore {
    shards: Vec<Shard>,
}

impl MemoryEventStore {
    /// Create a new memory store
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let shards = (0..config.shards)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Ok(Self { shards })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, id: &EventId) -> &Shard {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    async fn read_shard(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<RwLockReadGuard<'_, HashMap<EventId, StoredRecord>>> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let shard = self.shard_for(id);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            guard = shard.read() => Ok(guard),
        }
    }

    async fn write_shard(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<RwLockWriteGuard<'_, HashMap<EventId, StoredRecord>>> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let shard = self.shard_for(id);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            guard = shard.write() => Ok(guard),
        }
    }

    async fn overwrite(&self, event: &ErrorEvent, cancel: &CancellationToken) -> StorageResult<u64> {
        let mut shard = self.write_shard(event.id(), cancel).await?;
        let version = shard.get(event.id()).map_or(1, |record| record.version + 1);
        shard.insert(
            event.id().clone(),
            StoredRecord {
                event: event.clone(),
                version,
            },
        );
        trace!("Stored event {} at version {}", event.id(), version);
        Ok(version)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn save(
        &self,
        event: &ErrorEvent,
        cancel: &CancellationToken,
    ) -> StorageResult<EventId> {
        self.overwrite(event, cancel).await?;
        Ok(event.id().clone())
    }

    async fn get_by_id(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<ErrorEvent>> {
        let shard = self.read_shard(id, cancel).await?;
        Ok(shard.get(id).map(|record| record.event.clone()))
    }

    async fn get_versioned(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Versioned<ErrorEvent>>> {
        let shard = self.read_shard(id, cancel).await?;
        Ok(shard.get(id).map(|record| Versioned {
            value: record.event.clone(),
            version: record.version,
        }))
    }

    async fn update(&self, event: &ErrorEvent, cancel: &CancellationToken) -> StorageResult<()> {
        self.overwrite(event, cancel).await.map(|_| ())
    }

    async fn update_if_version(
        &self,
        event: &ErrorEvent,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> StorageResult<u64> {
        let mut shard = self.write_shard(event.id(), cancel).await?;
        let record = shard
            .get_mut(event.id())
            .ok_or_else(|| StorageError::not_found(event.id()))?;

        if record.version != expected_version {
            return Err(StorageError::Conflict {
                id: event.id().clone(),
                expected: expected_version,
                actual: record.version,
            });
        }

        record.event = event.clone();
        record.version += 1;
        Ok(record.version)
    }

    async fn len(&self, cancel: &CancellationToken) -> StorageResult<usize> {
        let mut total = 0;
        for shard in &self.shards {
            let guard = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StorageError::Cancelled),
                guard = shard.read() => guard,
            };
            total += guard.len();
        }
        Ok(total)
    }
}
