//! Keyword-driven analyzer that runs without any external service
//!
//! Rules are tried in order and the first whose pattern matches the message
//! or stack trace decides the classification.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::analyzer::{Analyzer, AnalyzerError};
use crate::domain::{AnalysisResult, ErrorClassification, ErrorEvent, ErrorSource};

struct Rule {
    classification: ErrorClassification,
    pattern: &'static Lazy<Regex>,
    root_cause: &'static str,
    suggestions: &'static [&'static str],
}

static NULL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)NullReferenceException|NullPointerException|\bNPE\b|null pointer|nil pointer|cannot read propert(y|ies) of (null|undefined)|'NoneType' object|on a `None` value",
    )
    .expect("Valid regex pattern")
});

static RESOURCE_EXHAUSTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)OOMKilled|OutOfMemory|out of memory|memory limit|no space left on device|quota exceeded|\bEvicted\b")
        .expect("Valid regex pattern")
});

static CONTAINER_RUNTIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)CrashLoopBackOff|back-off restarting|ImagePullBackOff|ErrImagePull|(liveness|readiness|startup) probe failed|CreateContainerError",
    )
    .expect("Valid regex pattern")
});

static TIMEOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)timed? ?out|deadline exceeded|TimeoutException|ETIMEDOUT")
        .expect("Valid regex pattern")
});

static NETWORK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)connection refused|ECONNREFUSED|connection reset|ECONNRESET|no route to host|name resolution|getaddrinfo|host unreachable|SocketException",
    )
    .expect("Valid regex pattern")
});

static PERMISSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)permission denied|access denied|forbidden|unauthori[sz]ed|\b40[13]\b|EACCES")
        .expect("Valid regex pattern")
});

static DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)ModuleNotFoundError|cannot find module|ClassNotFoundException|NoClassDefFoundError|could not load (file or )?assembly|DllNotFoundException|unresolved import",
    )
    .expect("Valid regex pattern")
});

static CONFIGURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)configuration|config (key|value|file)|environment variable|missing setting|ConfigMap|CreateContainerConfigError|invalid value for",
    )
    .expect("Valid regex pattern")
});

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule {
            classification: ErrorClassification::NullReference,
            pattern: &NULL_REFERENCE,
            root_cause: "A value was dereferenced while null or absent",
            suggestions: &[
                "add null check",
                "Validate inputs at the boundary where the value is produced",
                "Prefer non-nullable types or explicit Option handling for this field",
            ],
        },
        Rule {
            classification: ErrorClassification::ResourceExhausted,
            pattern: &RESOURCE_EXHAUSTED,
            root_cause: "The process ran out of memory, disk or quota",
            suggestions: &[
                "Review resource limits and actual usage for the workload",
                "Look for unbounded caches, buffers or leaks",
                "Raise limits only after confirming the usage is expected",
            ],
        },
        Rule {
            classification: ErrorClassification::ContainerRuntime,
            pattern: &CONTAINER_RUNTIME,
            root_cause: "The container failed to start or stay healthy",
            suggestions: &[
                "Inspect the previous container logs for the crash reason",
                "Verify the image reference and registry credentials",
                "Check probe endpoints and their timing settings",
            ],
        },
        Rule {
            classification: ErrorClassification::Timeout,
            pattern: &TIMEOUT,
            root_cause: "An operation exceeded its deadline",
            suggestions: &[
                "Identify the slow downstream call and measure its latency",
                "Add retries with backoff for transient slowness",
                "Revisit timeout values against realistic latencies",
            ],
        },
        Rule {
            classification: ErrorClassification::Network,
            pattern: &NETWORK,
            root_cause: "A network peer could not be reached",
            suggestions: &[
                "Confirm the target host and port are correct and listening",
                "Check DNS resolution and network policies between the services",
                "Retry transient connection failures with backoff",
            ],
        },
        Rule {
            classification: ErrorClassification::Permission,
            pattern: &PERMISSION,
            root_cause: "The caller lacked the required permissions or credentials",
            suggestions: &[
                "Verify the credentials or service account in use",
                "Grant the minimal role or file permission required",
            ],
        },
        Rule {
            classification: ErrorClassification::Dependency,
            pattern: &DEPENDENCY,
            root_cause: "A required module, package or library could not be loaded",
            suggestions: &[
                "Check that the dependency is declared and installed in the deployed artifact",
                "Align dependency versions between build and runtime",
            ],
        },
        Rule {
            classification: ErrorClassification::Configuration,
            pattern: &CONFIGURATION,
            root_cause: "Configuration is missing or invalid",
            suggestions: &[
                "Compare the deployed configuration with the expected settings",
                "Fail fast at startup when required settings are missing",
            ],
        },
    ]
});

/// Analyzer backed by an ordered list of keyword rules
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAnalyzer;

impl RuleBasedAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify an event; pure and synchronous
    pub fn classify(&self, event: &ErrorEvent) -> AnalysisResult {
        let haystack = match event.stack_trace() {
            Some(trace) => format!("{}\n{}", event.message(), trace),
            None => event.message().to_string(),
        };

        let matched = RULES
            .iter()
            .find_map(|rule| rule.pattern.find(&haystack).map(|m| (rule, m.as_str())));

        let headline = event.message().lines().next().unwrap_or_default().trim();
        let mut result = match matched {
            Some((rule, hit)) => {
                trace!(
                    "Event {} matched {} on '{}'",
                    event.id(),
                    rule.classification,
                    hit
                );
                let mut result = AnalysisResult::new(rule.classification)
                    .with_root_cause(rule.root_cause)
                    .with_raw_response(format!("rule={} match={}", rule.classification, hit));
                for suggestion in rule.suggestions {
                    result = result.with_suggestion(*suggestion);
                }
                result
            }
            None => AnalysisResult::new(ErrorClassification::Unknown)
                .with_root_cause("No known failure pattern matched the report")
                .with_suggestion("Attach a stack trace or more context and resubmit"),
        };

        result.summary = format!(
            "{} error reported by {}: {}",
            result.classification,
            event.source(),
            headline
        );

        if let Some(hint) = kubernetes_hint(event) {
            result.suggestions.push(hint);
        }
        result
    }
}

fn kubernetes_hint(event: &ErrorEvent) -> Option<String> {
    if event.source() != ErrorSource::Kubernetes {
        return None;
    }
    let context = event.kubernetes_context()?;
    let pod = context.pod_name.as_deref()?;
    let namespace = context.namespace.as_deref().unwrap_or("default");
    Some(format!(
        "Run `kubectl logs {pod} -n {namespace} --previous` and `kubectl describe pod {pod} -n {namespace}`"
    ))
}

#[async_trait]
impl Analyzer for RuleBasedAnalyzer {
    async fn analyze(
        &self,
        event: &ErrorEvent,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if cancel.is_cancelled() {
            return Err(AnalyzerError::Cancelled);
        }
        Ok(self.classify(event))
    }

    fn name(&self) -> &str {
        "rules"
    }
}
