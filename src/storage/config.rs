//! Storage configuration types and utilities

use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};

/// Event store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Number of independently locked shards
    #[serde(default = "default_shards")]
    pub shards: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> StorageResult<()> {
        if self.shards == 0 {
            return Err(StorageError::configuration("storage.shards must be at least 1"));
        }
        Ok(())
    }
}

/// What a bounded queue does with an enqueue when full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the enqueue with `QueueFull`
    #[default]
    Reject,
    /// Suspend the producer until space frees up
    Block,
}

/// Analysis queue configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum queued ids; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,

    /// Applies only when `capacity` is set
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl QueueConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            capacity: Some(capacity),
            overflow,
        }
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.capacity == Some(0) {
            return Err(StorageError::configuration(
                "queue.capacity must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_shards() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.shards, 16);
        assert!(storage.validate().is_ok());

        let queue = QueueConfig::default();
        assert_eq!(queue.capacity, None);
        assert_eq!(queue.overflow, OverflowPolicy::Reject);
        assert!(queue.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(StorageConfig { shards: 0 }.validate().is_err());
        assert!(QueueConfig::bounded(0, OverflowPolicy::Block)
            .validate()
            .is_err());
    }

    #[test]
    fn test_overflow_policy_from_toml() {
        let queue: QueueConfig = toml::from_str("capacity = 32\noverflow = \"block\"").unwrap();
        assert_eq!(queue, QueueConfig::bounded(32, OverflowPolicy::Block));
    }
}
