//! Error event entity and its analysis lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::result::AnalysisResult;

/// Opaque unique identifier of an error event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where an error was reported from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    Application,
    Kubernetes,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Kubernetes => "kubernetes",
        }
    }

    /// Parse the wire tag, exact lowercase match only
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "application" => Some(Self::Application),
            "kubernetes" => Some(Self::Kubernetes),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workload metadata for errors raised inside a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesContext {
    pub namespace: Option<String>,
    pub pod_name: Option<String>,
    pub container_name: Option<String>,
    pub node_name: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub manifest_yaml: Option<String>,
}

/// Metadata describing the reporting application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationContext {
    pub application_name: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Analysis state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Analyzing => "Analyzing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid transition for event {id}: {from} -> {to}")]
    InvalidTransition {
        id: EventId,
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Invariant violated for event {id}: {detail}")]
    InvariantViolated { id: EventId, detail: String },
}

/// A single reported error awaiting or having undergone analysis
///
/// Identity, source, message and context are fixed at construction. Only the
/// lifecycle methods change status, and they keep `result`, `failure` and
/// `completed_at` consistent with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    id: EventId,
    source: ErrorSource,
    message: String,
    timestamp: DateTime<Utc>,
    stack_trace: Option<String>,
    kubernetes_context: Option<KubernetesContext>,
    application_context: Option<ApplicationContext>,
    status: AnalysisStatus,
    result: Option<AnalysisResult>,
    failure: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ErrorEvent {
    /// Create a pending event with a freshly generated id
    pub fn new(source: ErrorSource, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: EventId::generate(),
            source,
            message: message.into(),
            timestamp,
            stack_trace: None,
            kubernetes_context: None,
            application_context: None,
            status: AnalysisStatus::Pending,
            result: None,
            failure: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Replace the generated id, for callers that mint ids upstream
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_kubernetes_context(mut self, context: KubernetesContext) -> Self {
        self.kubernetes_context = Some(context);
        self
    }

    pub fn with_application_context(mut self, context: ApplicationContext) -> Self {
        self.application_context = Some(context);
        self
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn source(&self) -> ErrorSource {
        self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn kubernetes_context(&self) -> Option<&KubernetesContext> {
        self.kubernetes_context.as_ref()
    }

    pub fn application_context(&self) -> Option<&ApplicationContext> {
        self.application_context.as_ref()
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Analyzer failure reason, present only for `Failed` events
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Pending -> Analyzing
    pub fn begin_analysis(&mut self) -> Result<(), LifecycleError> {
        self.expect_status(AnalysisStatus::Pending, AnalysisStatus::Analyzing)?;
        self.status = AnalysisStatus::Analyzing;
        Ok(())
    }

    /// Analyzing -> Completed, attaching the result
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), LifecycleError> {
        self.expect_status(AnalysisStatus::Analyzing, AnalysisStatus::Completed)?;
        self.status = AnalysisStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Analyzing -> Failed, recording why
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), LifecycleError> {
        self.expect_status(AnalysisStatus::Analyzing, AnalysisStatus::Failed)?;
        self.status = AnalysisStatus::Failed;
        self.failure = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// The event together with its result, when it is Completed
    pub fn completed_view(&self) -> Option<(&ErrorEvent, &AnalysisResult)> {
        match (&self.status, &self.result) {
            (AnalysisStatus::Completed, Some(result)) => Some((self, result)),
            _ => None,
        }
    }

    /// Verify the status/result/completion invariants
    pub fn check_invariants(&self) -> Result<(), LifecycleError> {
        let completed = self.status == AnalysisStatus::Completed;
        let failed = self.status == AnalysisStatus::Failed;

        if completed != self.result.is_some() {
            return Err(self.violation(format!(
                "status {} but result {}",
                self.status,
                presence(self.result.is_some())
            )));
        }
        if self.status.is_terminal() != self.completed_at.is_some() {
            return Err(self.violation(format!(
                "status {} but completedAt {}",
                self.status,
                presence(self.completed_at.is_some())
            )));
        }
        if failed != self.failure.is_some() {
            return Err(self.violation(format!(
                "status {} but failure {}",
                self.status,
                presence(self.failure.is_some())
            )));
        }
        Ok(())
    }

    fn expect_status(
        &self,
        expected: AnalysisStatus,
        to: AnalysisStatus,
    ) -> Result<(), LifecycleError> {
        if self.status != expected {
            return Err(LifecycleError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> LifecycleError {
        LifecycleError::InvariantViolated {
            id: self.id.clone(),
            detail,
        }
    }
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "absent"
    }
}
