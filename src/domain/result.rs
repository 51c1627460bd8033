//! Analysis output attached to completed events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome category assigned by an analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Dereference of a null/None/undefined value
    NullReference,
    /// Missing or invalid configuration
    Configuration,
    /// Connectivity failure (refused, reset, DNS)
    Network,
    /// Operation exceeded its deadline
    Timeout,
    /// Memory, disk or quota exhaustion
    ResourceExhausted,
    /// Authentication or authorization failure
    Permission,
    /// Missing module, package or external service
    Dependency,
    /// Container/pod lifecycle failure (crash loops, image pulls, probes)
    ContainerRuntime,
    /// Nothing matched
    Unknown,
}

impl ErrorClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NullReference => "NullReference",
            Self::Configuration => "Configuration",
            Self::Network => "Network",
            Self::Timeout => "Timeout",
            Self::ResourceExhausted => "ResourceExhausted",
            Self::Permission => "Permission",
            Self::Dependency => "Dependency",
            Self::ContainerRuntime => "ContainerRuntime",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output of analyzing an [`ErrorEvent`](super::ErrorEvent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub classification: ErrorClassification,
    pub root_cause: String,
    pub summary: String,
    /// Remediation steps, most relevant first
    pub suggestions: Vec<String>,
    /// Raw analyzer output kept for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    pub fn new(classification: ErrorClassification) -> Self {
        Self {
            classification,
            root_cause: String::new(),
            summary: String::new(),
            suggestions: Vec::new(),
            raw_response: None,
        }
    }

    pub fn with_root_cause(mut self, root_cause: impl Into<String>) -> Self {
        self.root_cause = root_cause.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serializes_as_pascal_case() {
        let json = serde_json::to_string(&ErrorClassification::NullReference).unwrap();
        assert_eq!(json, "\"NullReference\"");
        assert_eq!(
            ErrorClassification::ResourceExhausted.to_string(),
            "ResourceExhausted"
        );
    }

    #[test]
    fn test_builder_preserves_suggestion_order() {
        let result = AnalysisResult::new(ErrorClassification::Network)
            .with_suggestion("first")
            .with_suggestion("second")
            .with_suggestion("third");

        assert_eq!(result.suggestions, vec!["first", "second", "third"]);
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn test_result_json_uses_camel_case() {
        let result = AnalysisResult::new(ErrorClassification::Timeout)
            .with_root_cause("slow upstream")
            .with_raw_response("{}");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["rootCause"], "slow upstream");
        assert_eq!(value["rawResponse"], "{}");
    }
}
