//! Runtime initialization and setup
//!
//! Wires the repository, the ingest service and the analysis worker into a
//! running pipeline.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::analysis::{AnalysisWorker, Analyzer, WorkerStats};
use crate::app::config::FaultlineConfig;
use crate::ingest::IngestService;
use crate::storage::ErrorRepository;

/// A repository with its worker running in the background
pub struct Pipeline {
    service: IngestService,
    worker: JoinHandle<WorkerStats>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Build the repository from config and spawn the worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &FaultlineConfig, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        config.validate()?;
        let repository = ErrorRepository::from_config(&config.storage, &config.queue)?;
        let cancel = CancellationToken::new();
        let worker = AnalysisWorker::new(repository.clone(), analyzer, config.worker.clone())
            .spawn(cancel.clone());

        info!(
            "Pipeline started ({} shards, analysis timeout {:?})",
            config.storage.shards, config.worker.analysis_timeout
        );
        Ok(Self {
            service: IngestService::new(repository),
            worker,
            cancel,
        })
    }

    pub fn service(&self) -> &IngestService {
        &self.service
    }

    pub fn repository(&self) -> &ErrorRepository {
        self.service.repository()
    }

    /// Token observed by the worker; cancelling it stops the loop
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop accepting work and wait until every queued event is analyzed
    pub async fn drain(self) -> Result<WorkerStats> {
        self.repository().close_queue();
        self.worker.await.context("Analysis worker panicked")
    }

    /// Stop the worker without draining the queue
    pub async fn shutdown(self) -> Result<WorkerStats> {
        self.cancel.cancel();
        self.repository().close_queue();
        self.worker.await.context("Analysis worker panicked")
    }
}
