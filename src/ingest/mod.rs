//! Producer-facing ingest and query boundaries

pub mod request;
pub mod service;

pub use request::{AnalyzeErrorRequest, AnalyzeErrorResponse, ErrorAnalysisResponse};
pub use service::IngestService;
