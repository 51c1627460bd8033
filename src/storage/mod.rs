//! Storage layer for error events
//!
//! Provides a keyed, thread-safe event store, the queue of ids awaiting
//! analysis, and the [`ErrorRepository`] façade combining both.

pub mod backends;
pub mod config;
pub mod error;
pub mod repository;
pub mod traits;
pub mod types;


pub use backends::{ChannelQueue, MemoryEventStore};
pub use config::{OverflowPolicy, QueueConfig, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use repository::ErrorRepository;
pub use traits::{AnalysisQueue, EventStore};
pub use types::{Dequeued, Versioned};
