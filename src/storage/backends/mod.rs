//! Storage backend implementations

pub mod memory;
pub mod queue;

pub use memory::MemoryEventStore;
pub use queue::ChannelQueue;
