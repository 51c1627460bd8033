//! Error analysis
//!
//! - `analyzer` - the [`Analyzer`] boundary implemented by classifiers
//! - `rules` - offline keyword classifier
//! - `worker` - the single consumer that moves queued events to a terminal state

pub mod analyzer;
pub mod rules;
pub mod worker;

pub use analyzer::{Analyzer, AnalyzerError};
pub use rules::RuleBasedAnalyzer;
pub use worker::{AnalysisWorker, WorkerConfig, WorkerStats};
