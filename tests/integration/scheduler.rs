//! Batch scheduling with in-process dispatchers

use crate::mock_server::items;
use async_trait::async_trait;
use extract_bench::aggregate::TaskResolution;
use extract_bench::batch::{Batch, BatchPlan, BatchScheduler};
use extract_bench::progress::{InMemoryProgressSink, ProgressEvent};
use extract_bench::transport::HttpReply;
use extract_bench::{Dispatch, RequestItem, RequestOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn created(index: usize, item: &RequestItem) -> RequestOutcome {
    let reply = HttpReply {
        status: 201,
        body: format!(r#"{{"index":{}}}"#, index),
        received_at: Instant::now(),
    };
    RequestOutcome::from_reply(index, item, Duration::from_millis(5), reply, 201)
}

/// Sleeps, then succeeds. Later indices finish first within a batch.
struct SlowDispatcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowDispatcher {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Dispatch for SlowDispatcher {
    async fn dispatch(&self, index: usize, item: RequestItem) -> RequestOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100 - (index as u64 % 10) * 10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        created(index, &item)
    }
}

/// Panics for the listed indices, succeeds for the rest.
struct FaultyDispatcher {
    faulty: Vec<usize>,
}

#[async_trait]
impl Dispatch for FaultyDispatcher {
    async fn dispatch(&self, index: usize, item: RequestItem) -> RequestOutcome {
        if self.faulty.contains(&index) {
            panic!("boom at {}", index);
        }
        created(index, &item)
    }
}

struct InstantDispatcher;

#[async_trait]
impl Dispatch for InstantDispatcher {
    async fn dispatch(&self, index: usize, item: RequestItem) -> RequestOutcome {
        created(index, &item)
    }
}

#[tokio::test(start_paused = true)]
async fn test_batches_never_interleave_and_fill_to_batch_size() {
    let dispatcher = Arc::new(SlowDispatcher::new());
    let scheduler = BatchScheduler::new(dispatcher.clone()).with_cooldown(Duration::ZERO);

    let run = scheduler.run(BatchPlan::new(items(7), 3).unwrap()).await;

    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 7);
    assert_eq!(dispatcher.peak.load(Ordering::SeqCst), 3);
    assert_eq!(run.results.results.len(), 7);
    assert_eq!(
        run.tallies.iter().map(|t| t.items).collect::<Vec<_>>(),
        vec![3, 3, 1]
    );
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_submission_order_not_completion_order() {
    let scheduler =
        BatchScheduler::new(Arc::new(SlowDispatcher::new())).with_cooldown(Duration::ZERO);

    let run = scheduler.run(BatchPlan::new(items(10), 5).unwrap()).await;

    let indices: Vec<usize> = run.results.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_panicking_task_becomes_fault_without_aborting_siblings() {
    let scheduler = BatchScheduler::new(Arc::new(FaultyDispatcher { faulty: vec![1, 4] }))
        .with_cooldown(Duration::ZERO);

    let run = scheduler.run(BatchPlan::new(items(6), 3).unwrap()).await;

    // every item resolved exactly once, as an outcome or as a fault
    assert_eq!(run.results.results.len() + run.results.errors.len(), 6);
    let indices: Vec<usize> = run.results.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 2, 3, 5]);

    assert_eq!(run.results.errors.len(), 2);
    assert_eq!(run.results.errors[0].batch, 1);
    assert_eq!(run.results.errors[1].batch, 2);
    assert!(run.results.errors[0].error.contains("boom at 1"));

    assert_eq!(run.tallies[0].successful, 2);
    assert_eq!(run.tallies[0].failed, 1);
    assert_eq!(run.tallies[0].faults, 1);

    let stats = run.results.summary();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.successful, 4);
    assert_eq!(stats.faults, 2);
}

#[tokio::test]
async fn test_dispatch_batch_returns_one_resolution_per_item() {
    let scheduler = BatchScheduler::new(Arc::new(FaultyDispatcher { faulty: vec![11] }));
    let batch = Batch {
        number: 4,
        items: items(3)
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i + 10, item))
            .collect(),
    };

    let resolutions = scheduler.dispatch_batch(batch).await;

    assert_eq!(resolutions.len(), 3);
    assert!(matches!(&resolutions[0], TaskResolution::Outcome(o) if o.index == 10));
    assert!(matches!(&resolutions[1], TaskResolution::Fault(f) if f.batch == 4));
    assert!(matches!(&resolutions[2], TaskResolution::Outcome(o) if o.index == 12));
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_only_between_batches() {
    let scheduler =
        BatchScheduler::new(Arc::new(InstantDispatcher)).with_cooldown(Duration::from_secs(1));

    let start = tokio::time::Instant::now();
    let run = scheduler.run(BatchPlan::new(items(5), 2).unwrap()).await;
    let elapsed = start.elapsed();

    // three batches, two pauses
    assert_eq!(run.tallies.len(), 3);
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_single_batch_skips_cooldown() {
    let scheduler =
        BatchScheduler::new(Arc::new(InstantDispatcher)).with_cooldown(Duration::from_secs(1));

    let start = tokio::time::Instant::now();
    let run = scheduler.run(BatchPlan::new(items(5), 10).unwrap()).await;

    assert_eq!(run.tallies.len(), 1);
    assert_eq!(run.tallies[0].items, 5);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_empty_plan_resolves_immediately() {
    let scheduler = BatchScheduler::new(Arc::new(InstantDispatcher));
    let run = scheduler.run(BatchPlan::new(Vec::new(), 3).unwrap()).await;
    assert!(run.tallies.is_empty());
    assert!(run.results.results.is_empty());
    assert_eq!(run.results.summary().success_rate, 0.0);
}

#[tokio::test]
async fn test_progress_events_bracket_each_batch() {
    let sink = Arc::new(InMemoryProgressSink::new());
    let scheduler = BatchScheduler::new(Arc::new(InstantDispatcher))
        .with_cooldown(Duration::ZERO)
        .with_progress_sink(sink.clone());

    scheduler.run(BatchPlan::new(items(3), 2).unwrap()).await;

    let events = sink.events();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], ProgressEvent::BatchStarted { batch: 1, items: 2 });
    assert!(matches!(&events[1], ProgressEvent::BatchCompleted(t) if t.batch == 1 && t.successful == 2));
    assert_eq!(events[2], ProgressEvent::BatchStarted { batch: 2, items: 1 });
    assert!(matches!(&events[3], ProgressEvent::BatchCompleted(t) if t.batch == 2));
}
