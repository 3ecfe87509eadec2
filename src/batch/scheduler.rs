//! Batch scheduler.
//!
//! Runs batches strictly in sequence. Within a batch every item is its own
//! tokio task; the batch resolves once all of them have, and results are
//! folded in submission order. A task that panics or is cancelled becomes a
//! [`BatchFault`] instead of taking its siblings down.

use super::plan::{Batch, BatchPlan};
use crate::aggregate::{BatchFault, BatchTally, ResultAggregator, ResultSet, TaskResolution};
use crate::config::DEFAULT_COOLDOWN;
use crate::executor::Dispatch;
use crate::progress::{noop_sink, ProgressEvent, ProgressSink};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{info, warn};

/// Everything the scheduler produced for one run.
#[derive(Debug, Clone)]
pub struct ScheduledRun {
    pub results: ResultSet,
    pub tallies: Vec<BatchTally>,
    pub elapsed: Duration,
}

pub struct BatchScheduler {
    dispatcher: Arc<dyn Dispatch>,
    cooldown: Duration,
    progress: Arc<dyn ProgressSink>,
}

impl BatchScheduler {
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            dispatcher,
            cooldown: DEFAULT_COOLDOWN,
            progress: noop_sink(),
        }
    }

    pub fn with_cooldown(mut self, d: Duration) -> Self {
        self.cooldown = d;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Dispatch every batch of `plan`, pausing `cooldown` between batches
    /// (never after the last one). No retries.
    pub async fn run(&self, plan: BatchPlan) -> ScheduledRun {
        let start = Instant::now();
        let total = plan.len();
        let mut aggregator = ResultAggregator::new();

        for batch in plan.into_batches() {
            let number = batch.number;
            self.progress.report(&ProgressEvent::BatchStarted {
                batch: number,
                items: batch.len(),
            });

            let batch_start = Instant::now();
            let resolutions = self.dispatch_batch(batch).await;
            let tally = aggregator.fold_batch(number, resolutions, batch_start.elapsed());

            info!(
                batch = number,
                of = total,
                successful = tally.successful,
                failed = tally.failed,
                duration_ms = tally.duration.as_millis() as u64,
                "batch completed"
            );
            self.progress.report(&ProgressEvent::BatchCompleted(tally));

            if number < total && !self.cooldown.is_zero() {
                tokio::time::sleep(self.cooldown).await;
            }
        }

        let (results, tallies) = aggregator.into_parts();
        ScheduledRun {
            results,
            tallies,
            elapsed: start.elapsed(),
        }
    }

    /// Fan out one batch and wait for every task. The returned resolutions are
    /// in submission order, one per item.
    pub async fn dispatch_batch(&self, batch: Batch) -> Vec<TaskResolution> {
        let number = batch.number;
        let handles: Vec<_> = batch
            .items
            .into_iter()
            .map(|(index, item)| {
                let dispatcher = Arc::clone(&self.dispatcher);
                tokio::spawn(async move { dispatcher.dispatch(index, item).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(outcome) => TaskResolution::Outcome(outcome),
                Err(e) => {
                    let message = describe_join_error(e);
                    warn!(batch = number, error = %message, "task faulted outside request handling");
                    TaskResolution::Fault(BatchFault::new(number, message))
                }
            })
            .collect()
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            format!("task panicked: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("task panicked: {}", s)
        } else {
            "task panicked".to_string()
        }
    } else {
        err.to_string()
    }
}
