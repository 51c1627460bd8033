//! Integration tests for the ingest -> queue -> worker pipeline
//!
//! These run the public API end to end: concurrent producers submit reports
//! while the single worker drains the queue, then every record is checked
//! against the lifecycle invariants.

use async_trait::async_trait;
use faultline::analysis::{Analyzer, AnalyzerError, RuleBasedAnalyzer, WorkerConfig};
use faultline::app::{FaultlineConfig, Pipeline};
use faultline::domain::{
    AnalysisResult, AnalysisStatus, ErrorClassification, ErrorEvent, EventId,
};
use faultline::ingest::AnalyzeErrorRequest;
use faultline::report::{render_completed, MarkdownReportGenerator};
use faultline::storage::{OverflowPolicy, QueueConfig, StorageConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fails every event whose message mentions "flaky"
struct FlakyAnalyzer;

#[async_trait]
impl Analyzer for FlakyAnalyzer {
    async fn analyze(
        &self,
        event: &ErrorEvent,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if event.message().contains("flaky") {
            return Err(AnalyzerError::Backend("upstream model returned 503".to_string()));
        }
        RuleBasedAnalyzer::new().analyze(event, cancel).await
    }
}

async fn assert_all_terminal(pipeline_ids: &[EventId], pipeline: &faultline::ingest::IngestService) {
    let cancel = CancellationToken::new();
    for id in pipeline_ids {
        let event = pipeline
            .repository()
            .get_by_id(id, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(event.status().is_terminal(), "{} left in {}", id, event.status());
        assert!(event.check_invariants().is_ok());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_all_events_reach_terminal_state() {
    let pipeline = Pipeline::start(&FaultlineConfig::default(), Arc::new(FlakyAnalyzer)).unwrap();

    let mut producers = Vec::new();
    for producer in 0..4 {
        let service = pipeline.service().clone();
        producers.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let mut ids = Vec::new();
            for i in 0..50 {
                let message = if i % 10 == 0 {
                    format!("flaky failure {producer}-{i}")
                } else {
                    format!("NullPointerException in handler {producer}-{i}")
                };
                let response = service
                    .submit(AnalyzeErrorRequest::new("application", message), &cancel)
                    .await
                    .unwrap();
                ids.push(response.id);
            }
            ids
        }));
    }

    let mut ids = Vec::new();
    for producer in producers {
        ids.extend(producer.await.unwrap());
    }
    let service = pipeline.service().clone();
    let stats = tokio::time::timeout(Duration::from_secs(10), pipeline.drain())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 200);
    assert_eq!(stats.processed, 200);
    assert_eq!(stats.failed, 20);
    assert_eq!(stats.completed, 180);
    assert_eq!(stats.skipped, 0);
    assert_all_terminal(&ids, &service).await;
}

#[tokio::test]
async fn test_query_reflects_completed_analysis_and_renders() {
    let pipeline =
        Pipeline::start(&FaultlineConfig::default(), Arc::new(RuleBasedAnalyzer::new())).unwrap();
    let cancel = CancellationToken::new();

    let response = pipeline
        .service()
        .submit(AnalyzeErrorRequest::new("application", "NPE"), &cancel)
        .await
        .unwrap();
    assert_eq!(response.status, AnalysisStatus::Pending);

    let service = pipeline.service().clone();
    pipeline.drain().await.unwrap();

    let status = service.query(&response.id, &cancel).await.unwrap().unwrap();
    assert_eq!(status.status, AnalysisStatus::Completed);
    let result = status.result.unwrap();
    assert_eq!(result.classification, ErrorClassification::NullReference);
    assert_eq!(result.suggestions[0], "add null check");

    let event = service
        .repository()
        .get_by_id(&response.id, &cancel)
        .await
        .unwrap()
        .unwrap();
    let report = render_completed(&MarkdownReportGenerator::new().unwrap(), &event).unwrap();
    assert!(report.contains("1. add null check"));
}

#[tokio::test]
async fn test_bounded_queue_with_blocking_producers() {
    let config = FaultlineConfig {
        storage: StorageConfig { shards: 2 },
        queue: QueueConfig::bounded(4, OverflowPolicy::Block),
        worker: WorkerConfig::default(),
    };
    let pipeline = Pipeline::start(&config, Arc::new(RuleBasedAnalyzer::new())).unwrap();
    let cancel = CancellationToken::new();

    let mut ids = Vec::new();
    for i in 0..40 {
        let response = pipeline
            .service()
            .submit(
                AnalyzeErrorRequest::new("kubernetes", format!("OOMKilled pod {i}")),
                &cancel,
            )
            .await
            .unwrap();
        ids.push(response.id);
    }

    let service = pipeline.service().clone();
    let stats = pipeline.drain().await.unwrap();
    assert_eq!(stats.completed, 40);
    assert_all_terminal(&ids, &service).await;
}

#[tokio::test]
async fn test_shutdown_stops_idle_worker() {
    let pipeline =
        Pipeline::start(&FaultlineConfig::default(), Arc::new(RuleBasedAnalyzer::new())).unwrap();
    let service = pipeline.service().clone();

    let stats = tokio::time::timeout(Duration::from_secs(2), pipeline.shutdown())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.processed, 0);
    assert!(service.repository().is_queue_closed());
}
