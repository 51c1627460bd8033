//! Performance benchmarks for repository operations

use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use faultline::domain::{ErrorEvent, ErrorSource};
use faultline::storage::{ErrorRepository, QueueConfig, StorageConfig};
use std::hint::black_box;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn create_events(count: usize) -> Vec<ErrorEvent> {
    (0..count)
        .map(|i| {
            ErrorEvent::new(
                ErrorSource::Application,
                format!("NullPointerException #{i}"),
                Utc::now(),
            )
            .with_stack_trace("at Service.handle()\n".repeat(20))
        })
        .collect()
}

fn bench_save_and_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("repository_save_get");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for shards in [1, 16].iter() {
        group.bench_with_input(BenchmarkId::new("shards", shards), shards, |b, &shards| {
            let repo = ErrorRepository::from_config(
                &StorageConfig { shards },
                &QueueConfig::unbounded(),
            )
            .unwrap();
            let events = create_events(1000);
            let cancel = CancellationToken::new();
            let (repo, events, cancel) = (&repo, &events, &cancel);

            b.to_async(&rt).iter(|| async move {
                for event in events {
                    let id = repo.save(event, cancel).await.unwrap();
                    black_box(repo.get_by_id(&id, cancel).await.unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_queue_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("repository_queue");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("enqueue_dequeue", size), size, |b, &size| {
            let repo = ErrorRepository::in_memory().unwrap();
            let ids: Vec<_> = create_events(size).iter().map(|e| e.id().clone()).collect();
            let cancel = CancellationToken::new();
            let (repo, ids, cancel) = (&repo, &ids, &cancel);

            b.to_async(&rt).iter(|| async move {
                for id in ids {
                    repo.enqueue_for_analysis(id.clone(), cancel).await.unwrap();
                }
                for _ in 0..ids.len() {
                    black_box(repo.dequeue_for_analysis(cancel).await);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_save_and_get, bench_queue_round_trip);
criterion_main!(benches);
