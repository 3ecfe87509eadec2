//! 进度输出：运行横幅、数据集加载与每个批次的进度行。
//!
//! Progress reporting.
//!
//! The scheduler and runner describe what they are doing through
//! [`ProgressEvent`]s; where the events go is decided by the caller.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ProgressSink`] | Trait for progress destinations |
//! | [`NoopProgressSink`] | Default sink, discards everything |
//! | [`ConsoleProgressSink`] | Human-readable lines on stdout |
//! | [`InMemoryProgressSink`] | Records events, for tests |

use crate::aggregate::BatchTally;
use crate::config::EndpointKind;
use crate::utils::seconds_3dp;
use std::sync::{Arc, RwLock};

pub const RULE: &str = "============================================================";

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted {
        endpoint: EndpointKind,
        batch_size: usize,
        base_url: String,
    },
    DatasetLoaded {
        items: usize,
    },
    Planned {
        items: usize,
        batches: usize,
    },
    BatchStarted {
        batch: usize,
        items: usize,
    },
    BatchCompleted(BatchTally),
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// No-op sink (default).
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn report(&self, _: &ProgressEvent) {}
}

/// Returns a no-op progress sink.
pub fn noop_sink() -> Arc<dyn ProgressSink> {
    Arc::new(NoopProgressSink)
}

/// Console sink for interactive runs.
#[derive(Default)]
pub struct ConsoleProgressSink;

impl ConsoleProgressSink {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for ConsoleProgressSink {
    fn report(&self, event: &ProgressEvent) {
        println!("{}", render_event(event));
    }
}

/// Render one event as console text.
pub fn render_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::RunStarted {
            endpoint,
            batch_size,
            base_url,
        } => format!(
            "Starting run for endpoint: {}\nConfiguration: batch_size={}, url={}\n{}",
            endpoint, batch_size, base_url, RULE
        ),
        ProgressEvent::DatasetLoaded { items } => format!("Dataset loaded: {} items found", items),
        ProgressEvent::Planned { items, batches } => {
            format!("Total of {} items split into {} batches", items, batches)
        }
        ProgressEvent::BatchStarted { batch, items } => {
            format!("Processing batch {} ({} items)...", batch, items)
        }
        ProgressEvent::BatchCompleted(tally) => {
            let mut line = format!(
                "Batch {} completed in {}s - {} successful, {} failed",
                tally.batch,
                seconds_3dp(tally.duration),
                tally.successful,
                tally.failed
            );
            if tally.faults > 0 {
                line.push_str(&format!(" ({} faulted)", tally.faults));
            }
            line
        }
    }
}

/// In-memory sink for testing.
pub struct InMemoryProgressSink {
    events: RwLock<Vec<ProgressEvent>>,
}

impl InMemoryProgressSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Tallies of completed batches, in order.
    pub fn completed_batches(&self) -> Vec<BatchTally> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::BatchCompleted(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for InMemoryProgressSink {
    fn report(&self, event: &ProgressEvent) {
        self.events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
