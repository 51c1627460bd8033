//! Ingest and query handlers in front of the repository

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::request::{AnalyzeErrorRequest, AnalyzeErrorResponse, ErrorAnalysisResponse};
use crate::domain::EventId;
use crate::error::Result;
use crate::storage::ErrorRepository;

/// Accepts error reports and answers status queries
#[derive(Clone)]
pub struct IngestService {
    repository: ErrorRepository,
}

impl IngestService {
    pub fn new(repository: ErrorRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ErrorRepository {
        &self.repository
    }

    /// Validate, store and queue a report for analysis
    pub async fn submit(
        &self,
        request: AnalyzeErrorRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalyzeErrorResponse> {
        let event = request.into_event()?;
        let status = event.status();

        let id = self.repository.save(&event, cancel).await?;
        self.repository
            .enqueue_for_analysis(id.clone(), cancel)
            .await?;

        info!("Accepted {} error report {}", event.source(), id);
        Ok(AnalyzeErrorResponse { id, status })
    }

    /// Current status and, once completed, the analysis result
    pub async fn query(
        &self,
        id: &EventId,
        cancel: &CancellationToken,
    ) -> Result<Option<ErrorAnalysisResponse>> {
        let event = self.repository.get_by_id(id, cancel).await?;
        if event.is_none() {
            debug!("Query for unknown event {}", id);
        }
        Ok(event.as_ref().map(ErrorAnalysisResponse::from))
    }
}
