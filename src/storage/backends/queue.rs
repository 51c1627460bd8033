//! Channel-backed analysis queue
//!
//! Producers push event ids through a tokio mpsc channel; a single worker
//! drains it. Closing the queue drops the stored sender so the receiver
//! observes the end of the stream once buffered ids are consumed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::EventId;
use crate::storage::{
    config::{OverflowPolicy, QueueConfig},
    error::{StorageError, StorageResult},
    traits::AnalysisQueue,
    types::Dequeued,
};

#[derive(Clone)]
enum QueueSender {
    Unbounded(mpsc::UnboundedSender<EventId>),
    Bounded(mpsc::Sender<EventId>),
}

enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<EventId>),
    Bounded(mpsc::Receiver<EventId>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<EventId> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

/// FIFO queue of event ids with an explicit closed state
pub struct ChannelQueue {
    tx: RwLock<Option<QueueSender>>,
    /// Held for the duration of a dequeue; one consumer at a time
    rx: Mutex<QueueReceiver>,
    closed: CancellationToken,
    depth: AtomicUsize,
    config: QueueConfig,
}

impl ChannelQueue {
    pub fn new(config: &QueueConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config.clone()))
    }

    /// Queue with no capacity limit
    pub fn unbounded() -> Self {
        Self::with_config(QueueConfig::unbounded())
    }

    fn with_config(config: QueueConfig) -> Self {
        let (tx, rx) = match config.capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity);
                (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
        };

        Self {
            tx: RwLock::new(Some(tx)),
            rx: Mutex::new(rx),
            closed: CancellationToken::new(),
            depth: AtomicUsize::new(0),
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn sender(&self) -> StorageResult<QueueSender> {
        let slot = self.tx.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone().ok_or(StorageError::QueueClosed)
    }

    async fn send(
        &self,
        sender: QueueSender,
        id: EventId,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        match sender {
            QueueSender::Unbounded(tx) => tx.send(id).map_err(|_| StorageError::QueueClosed),
            QueueSender::Bounded(tx) => match self.config.overflow {
                OverflowPolicy::Reject => tx.try_send(id).map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => {
                        StorageError::QueueFull(tx.max_capacity())
                    }
                    mpsc::error::TrySendError::Closed(_) => StorageError::QueueClosed,
                }),
                OverflowPolicy::Block => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(StorageError::Cancelled),
                        _ = self.closed.cancelled() => Err(StorageError::QueueClosed),
                        sent = tx.send(id) => sent.map_err(|_| StorageError::QueueClosed),
                    }
                }
            },
        }
    }
}

#[async_trait]
impl AnalysisQueue for ChannelQueue {
    async fn enqueue(&self, id: EventId, cancel: &CancellationToken) -> StorageResult<()> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if self.closed.is_cancelled() {
            return Err(StorageError::QueueClosed);
        }

        let sender = self.sender()?;
        debug!("Enqueueing event {} for analysis", id);

        // Counted before the send so the consumer's decrement never underflows
        self.depth.fetch_add(1, Ordering::SeqCst);
        let outcome = self.send(sender, id, cancel).await;
        if outcome.is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        outcome
    }

    async fn dequeue(&self, cancel: &CancellationToken) -> Dequeued {
        if cancel.is_cancelled() {
            return Dequeued::Cancelled;
        }

        let mut rx = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Dequeued::Cancelled,
            guard = self.rx.lock() => guard,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Dequeued::Cancelled,
            item = rx.recv() => match item {
                Some(id) => {
                    self.depth.fetch_sub(1, Ordering::SeqCst);
                    Dequeued::Ready(id)
                }
                None => Dequeued::Closed,
            },
        }
    }

    fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        let mut slot = self.tx.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.take();
        info!(
            "Analysis queue closed with {} ids still buffered",
            self.depth.load(Ordering::SeqCst)
        );
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn pending(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn id(s: &str) -> EventId {
        EventId::from(s)
    }

    #[tokio::test]
    async fn test_fifo_single_producer() {
        let queue = ChannelQueue::unbounded();
        let cancel = CancellationToken::new();

        for name in ["id1", "id2", "id3"] {
            queue.enqueue(id(name), &cancel).await.unwrap();
        }
        assert_eq!(queue.pending(), 3);

        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("id1")));
        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("id2")));
        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("id3")));
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_returns_cancelled_within_deadline() {
        let queue = ChannelQueue::unbounded();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(2), queue.dequeue(&cancel))
            .await
            .expect("dequeue should unblock on cancellation");
        assert_eq!(outcome, Dequeued::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_dequeue_does_not_consume() {
        let queue = ChannelQueue::unbounded();
        let live = CancellationToken::new();
        queue.enqueue(id("kept"), &live).await.unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        assert_eq!(queue.dequeue(&cancelled).await, Dequeued::Cancelled);
        assert_eq!(queue.dequeue(&live).await, Dequeued::Ready(id("kept")));
    }

    #[tokio::test]
    async fn test_close_drains_then_reports_closed() {
        let queue = ChannelQueue::unbounded();
        let cancel = CancellationToken::new();
        queue.enqueue(id("buffered"), &cancel).await.unwrap();

        queue.close();
        assert!(queue.is_closed());
        assert_eq!(
            queue.enqueue(id("late"), &cancel).await,
            Err(StorageError::QueueClosed)
        );

        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("buffered")));
        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Closed);
    }

    #[tokio::test]
    async fn test_close_unblocks_waiting_consumer() {
        let queue = std::sync::Arc::new(ChannelQueue::unbounded());
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue(&CancellationToken::new()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let outcome = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, Dequeued::Closed);
    }

    #[tokio::test]
    async fn test_bounded_reject_policy() {
        let queue = ChannelQueue::new(&QueueConfig::bounded(2, OverflowPolicy::Reject)).unwrap();
        let cancel = CancellationToken::new();

        queue.enqueue(id("a"), &cancel).await.unwrap();
        queue.enqueue(id("b"), &cancel).await.unwrap();
        assert_eq!(
            queue.enqueue(id("c"), &cancel).await,
            Err(StorageError::QueueFull(2))
        );
        assert_eq!(queue.pending(), 2);
    }

    #[tokio::test]
    async fn test_bounded_block_policy_waits_for_space() {
        let queue = std::sync::Arc::new(
            ChannelQueue::new(&QueueConfig::bounded(1, OverflowPolicy::Block)).unwrap(),
        );
        let cancel = CancellationToken::new();
        queue.enqueue(id("first"), &cancel).await.unwrap();

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .enqueue(id("second"), &CancellationToken::new())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("first")));
        producer.await.unwrap().unwrap();
        assert_eq!(queue.dequeue(&cancel).await, Dequeued::Ready(id("second")));
    }

    #[tokio::test]
    async fn test_bounded_block_policy_honours_cancellation() {
        let queue = ChannelQueue::new(&QueueConfig::bounded(1, OverflowPolicy::Block)).unwrap();
        let live = CancellationToken::new();
        queue.enqueue(id("first"), &live).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        assert_eq!(
            queue.enqueue(id("second"), &cancel).await,
            Err(StorageError::Cancelled)
        );
        assert_eq!(queue.pending(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_constructor_matches_default_config() {
        let queue = ChannelQueue::unbounded();
        assert_eq!(queue.config(), &QueueConfig::default());

        let cancel = CancellationToken::new();
        for i in 0..1000 {
            queue.enqueue(id(&format!("id{i}")), &cancel).await.unwrap();
        }
        assert_eq!(queue.pending(), 1000);
    }
}
