//! # Faultline
//!
//! Accepts error reports from applications and Kubernetes workloads, stores
//! them, and hands them to an asynchronous analysis worker that classifies
//! each error and attaches remediation suggestions.
//!
//! ## Usage
//!
//! ```bash
//! faultline analyze reports.json [--output-dir reports/]
//! ```
//!
//! ## Modules
//!
//! - `domain` - Error events, their lifecycle and analysis results
//! - `storage` - Thread-safe event store, analysis queue and the repository façade
//! - `analysis` - Analyzer boundary, offline rule-based analyzer and the worker loop
//! - `ingest` - Request validation, submission and status queries
//! - `report` - Markdown rendering of completed analyses
//! - `app` - Configuration, logging and pipeline startup
pub mod analysis;
pub mod app;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod report;
pub mod storage;

pub use error::{Error, Result};
