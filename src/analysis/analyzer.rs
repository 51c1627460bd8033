//! Analyzer boundary

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::{AnalysisResult, ErrorEvent};

/// Failures an analyzer may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analyzer backend error: {0}")]
    Backend(String),

    #[error("Analyzer panicked: {0}")]
    Panicked(String),
}

/// Computes an [`AnalysisResult`] for an error event
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        event: &ErrorEvent,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalyzerError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "analyzer"
    }
}
