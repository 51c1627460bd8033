use tera::{Context, Tera};

use super::{ReportError, ReportGenerator};
use crate::domain::{AnalysisResult, ErrorEvent};

const TEMPLATE_NAME: &str = "report.md";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Markdown report rendered through an embedded tera template
pub struct MarkdownReportGenerator {
    template_engine: Tera,
}

impl MarkdownReportGenerator {
    pub fn new() -> Result<Self, ReportError> {
        Self::with_template(DEFAULT_MARKDOWN_TEMPLATE)
    }

    /// Use a caller-supplied template; it receives `event`, `result` and
    /// preformatted `timestamp`, `created_at`, `completed_at`
    pub fn with_template(template: &str) -> Result<Self, ReportError> {
        let mut template_engine = Tera::default();
        template_engine.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self { template_engine })
    }
}

impl ReportGenerator for MarkdownReportGenerator {
    fn render(&self, event: &ErrorEvent, result: &AnalysisResult) -> Result<String, ReportError> {
        let mut context = Context::new();
        context.insert("event", event);
        context.insert("result", result);
        context.insert(
            "timestamp",
            &event.timestamp().format(TIMESTAMP_FORMAT).to_string(),
        );
        context.insert(
            "created_at",
            &event.created_at().format(TIMESTAMP_FORMAT).to_string(),
        );
        context.insert(
            "completed_at",
            &event
                .completed_at()
                .map(|at| at.format(TIMESTAMP_FORMAT).to_string()),
        );

        Ok(self.template_engine.render(TEMPLATE_NAME, &context)?)
    }
}

const DEFAULT_MARKDOWN_TEMPLATE: &str = r##"# Error Analysis Report

| Field | Value |
|---|---|
| ID | `{{ event.id }}` |
| Source | {{ event.source }} |
| Status | {{ event.status }} |
| Occurred | {{ timestamp }} |
| Reported | {{ created_at }} |
{%- if completed_at %}
| Completed | {{ completed_at }} |
{%- endif %}

## Error

{{ event.message }}
{% if event.stackTrace %}
### Stack Trace

```text
{{ event.stackTrace }}
```
{% endif %}
{%- if event.kubernetesContext %}{% set k8s = event.kubernetesContext %}
## Kubernetes Context

{% if k8s.namespace %}- **Namespace:** {{ k8s.namespace }}
{% endif %}{% if k8s.podName %}- **Pod:** {{ k8s.podName }}
{% endif %}{% if k8s.containerName %}- **Container:** {{ k8s.containerName }}
{% endif %}{% if k8s.nodeName %}- **Node:** {{ k8s.nodeName }}
{% endif %}{% if k8s.labels %}- **Labels:**
{% for key, value in k8s.labels %}  - `{{ key }}={{ value }}`
{% endfor %}{% endif %}{% if k8s.manifestYaml %}
```yaml
{{ k8s.manifestYaml }}
```
{% endif %}{% endif %}
{%- if event.applicationContext %}{% set app = event.applicationContext %}
## Application Context

{% if app.applicationName %}- **Application:** {{ app.applicationName }}
{% endif %}{% if app.version %}- **Version:** {{ app.version }}
{% endif %}{% if app.environment %}- **Environment:** {{ app.environment }}
{% endif %}{% if app.metadata %}- **Metadata:**
{% for key, value in app.metadata %}  - `{{ key }}={{ value }}`
{% endfor %}{% endif %}{% endif %}
## Analysis

**Classification:** {{ result.classification }}

**Root Cause:** {{ result.rootCause }}

**Summary:** {{ result.summary }}

## Suggestions

{% for suggestion in result.suggestions %}{{ loop.index }}. {{ suggestion }}
{% endfor %}"##;
