//! Request and response shapes at the ingest and query boundaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AnalysisResult, AnalysisStatus, ApplicationContext, ErrorEvent, ErrorSource, EventId,
    KubernetesContext,
};
use crate::error::{Error, Result};

/// Structured error report submitted by a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeErrorRequest {
    pub source: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub kubernetes_context: Option<KubernetesContext>,
    #[serde(default)]
    pub application_context: Option<ApplicationContext>,
}

impl AnalyzeErrorRequest {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
            stack_trace: None,
            kubernetes_context: None,
            application_context: None,
        }
    }

    /// Check the request and resolve its source tag
    pub fn validate(&self) -> Result<ErrorSource> {
        let source = ErrorSource::parse(&self.source).ok_or_else(|| {
            Error::Validation(format!(
                "Source must be 'application' or 'kubernetes', got '{}'",
                self.source
            ))
        })?;

        if self.message.trim().is_empty() {
            return Err(Error::Validation("Message cannot be empty".to_string()));
        }

        Ok(source)
    }

    /// Validate and build a pending event
    pub fn into_event(self) -> Result<ErrorEvent> {
        let source = self.validate()?;
        let mut event = ErrorEvent::new(source, self.message, self.timestamp);
        if let Some(trace) = self.stack_trace {
            event = event.with_stack_trace(trace);
        }
        if let Some(context) = self.kubernetes_context {
            event = event.with_kubernetes_context(context);
        }
        if let Some(context) = self.application_context {
            event = event.with_application_context(context);
        }
        Ok(event)
    }
}

/// Acknowledgement returned once a report is stored and queued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeErrorResponse {
    pub id: EventId,
    pub status: AnalysisStatus,
}

/// Current state of a submitted report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysisResponse {
    pub id: EventId,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl From<&ErrorEvent> for ErrorAnalysisResponse {
    fn from(event: &ErrorEvent) -> Self {
        Self {
            id: event.id().clone(),
            status: event.status(),
            created_at: event.created_at(),
            completed_at: event.completed_at(),
            result: event.result().cloned(),
            failure: event.failure().map(str::to_string),
        }
    }
}
