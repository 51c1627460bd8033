//! Background worker draining the analysis queue
//!
//! The worker is the queue's single consumer. For each id it claims the
//! event (Pending -> Analyzing), runs the analyzer under a timeout and
//! writes the terminal state back. Once an id is dequeued it always ends in
//! Completed or Failed, even when the worker is being cancelled or the
//! analyzer panics.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::analyzer::{Analyzer, AnalyzerError};
use crate::domain::{AnalysisStatus, EventId};
use crate::storage::{Dequeued, ErrorRepository, StorageError};

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Upper bound on a single analyzer call
    #[serde(with = "humantime_serde", default = "default_analysis_timeout")]
    pub analysis_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            analysis_timeout: default_analysis_timeout(),
        }
    }
}

fn default_analysis_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Counters reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Ids that were unknown, already claimed, or hit a storage error
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    Skipped,
}

/// Single consumer of the analysis queue
pub struct AnalysisWorker {
    repository: ErrorRepository,
    analyzer: Arc<dyn Analyzer>,
    config: WorkerConfig,
}

impl AnalysisWorker {
    pub fn new(
        repository: ErrorRepository,
        analyzer: Arc<dyn Analyzer>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            repository,
            analyzer,
            config,
        }
    }

    /// Run the loop on a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<WorkerStats> {
        tokio::spawn(async move { self.run(&cancel).await })
    }

    /// Process ids until cancelled or the queue is closed and drained
    pub async fn run(&self, cancel: &CancellationToken) -> WorkerStats {
        info!("Analysis worker started (analyzer: {})", self.analyzer.name());
        let mut stats = WorkerStats::default();

        loop {
            let id = match self.repository.next_for_analysis(cancel).await {
                Dequeued::Ready(id) => id,
                Dequeued::Cancelled => {
                    debug!("Analysis worker cancelled");
                    break;
                }
                Dequeued::Closed => {
                    debug!("Analysis queue closed and drained");
                    break;
                }
            };

            stats.processed += 1;
            match self.process(&id, cancel).await {
                Outcome::Completed => stats.completed += 1,
                Outcome::Failed => stats.failed += 1,
                Outcome::Skipped => stats.skipped += 1,
            }
        }

        info!(
            "Analysis worker shutting down (processed {}, completed {}, failed {}, skipped {})",
            stats.processed, stats.completed, stats.failed, stats.skipped
        );
        stats
    }

    async fn process(&self, id: &EventId, cancel: &CancellationToken) -> Outcome {
        // Store writes ignore shutdown so a claimed event always reaches a terminal state
        let persist = CancellationToken::new();

        let snapshot = match self.repository.get_versioned(id, &persist).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                warn!("Dequeued unknown event {}, skipping", id);
                return Outcome::Skipped;
            }
            Err(e) => {
                error!("Failed to load event {}: {}", id, e);
                return Outcome::Skipped;
            }
        };

        let mut event = snapshot.value;
        if event.status() != AnalysisStatus::Pending {
            debug!("Event {} is already {}, skipping", id, event.status());
            return Outcome::Skipped;
        }
        if let Err(e) = event.begin_analysis() {
            warn!("{}", e);
            return Outcome::Skipped;
        }

        match self
            .repository
            .update_if_version(&event, snapshot.version, &persist)
            .await
        {
            Ok(_) => {}
            Err(StorageError::Conflict { .. }) => {
                warn!("Event {} changed before it could be claimed, skipping", id);
                return Outcome::Skipped;
            }
            Err(e) => {
                error!("Failed to mark event {} as analyzing: {}", id, e);
                return Outcome::Skipped;
            }
        }

        debug!("Analyzing event {}", id);
        let guarded = AssertUnwindSafe(self.analyzer.analyze(&event, cancel)).catch_unwind();
        let analysis = match tokio::time::timeout(self.config.analysis_timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => Err(AnalyzerError::Panicked(panic_message(&*payload))),
            Err(_) => Err(AnalyzerError::Timeout(self.config.analysis_timeout)),
        };

        let outcome = match analysis {
            Ok(result) => {
                debug!(
                    "Event {} classified as {} with {} suggestions",
                    id,
                    result.classification,
                    result.suggestions.len()
                );
                event.complete(result).map(|_| Outcome::Completed)
            }
            Err(e) => {
                warn!("Analysis failed for event {}: {}", id, e);
                event.fail(e.to_string()).map(|_| Outcome::Failed)
            }
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}", e);
                return Outcome::Skipped;
            }
        };

        // One retry; a second failure leaves the record in Analyzing
        if let Err(first) = self.repository.update(&event, &persist).await {
            warn!("Retrying result write for event {}: {}", id, first);
            if let Err(e) = self.repository.update(&event, &persist).await {
                error!("Failed to persist result for event {}: {}", id, e);
                return Outcome::Skipped;
            }
        }
        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
