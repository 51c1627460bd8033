//! Report rendering for completed analyses

pub mod markdown;

pub use markdown::MarkdownReportGenerator;

use thiserror::Error;

use crate::domain::{AnalysisResult, AnalysisStatus, ErrorEvent, EventId};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Event {id} is {status}, reports need a completed analysis")]
    NotCompleted { id: EventId, status: AnalysisStatus },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

/// Renders an analyzed event for humans
pub trait ReportGenerator: Send + Sync {
    fn render(&self, event: &ErrorEvent, result: &AnalysisResult) -> Result<String, ReportError>;
}

/// Render a report only when the event satisfies the Completed invariant
pub fn render_completed(
    generator: &dyn ReportGenerator,
    event: &ErrorEvent,
) -> Result<String, ReportError> {
    let (event, result) = event
        .completed_view()
        .ok_or_else(|| ReportError::NotCompleted {
            id: event.id().clone(),
            status: event.status(),
        })?;
    generator.render(event, result)
}
