//! Domain model for reported errors
//!
//! An [`ErrorEvent`] is the unit of work flowing through the pipeline. It is
//! created by the ingest path, stored, queued for analysis and finally moved
//! to a terminal state by the analysis worker.

pub mod event;
pub mod result;

pub use event::{
    AnalysisStatus, ApplicationContext, ErrorEvent, ErrorSource, EventId, KubernetesContext,
    LifecycleError,
};
pub use result::{AnalysisResult, ErrorClassification};
