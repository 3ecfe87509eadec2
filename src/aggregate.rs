//! Result aggregation: folds each resolved batch into the run's result and
//! fault logs and derives summary statistics.

use crate::executor::RequestOutcome;
use crate::utils::iso_now;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A task that failed outside the executor's own error handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFault {
    /// 1-based batch number.
    pub batch: usize,
    pub error: String,
    pub timestamp: String,
}

impl BatchFault {
    pub fn new(batch: usize, error: impl Into<String>) -> Self {
        Self {
            batch,
            error: error.into(),
            timestamp: iso_now(),
        }
    }
}

/// How one dispatched task resolved. Exactly one per item.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResolution {
    Outcome(RequestOutcome),
    Fault(BatchFault),
}

/// Append-only outcome and fault logs of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub results: Vec<RequestOutcome>,
    pub errors: Vec<BatchFault>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.successful()
    }

    /// Statistics over the outcome log. Faults are reported separately and do
    /// not count toward the totals.
    pub fn summary(&self) -> SummaryStats {
        let total = self.results.len();
        let successful = self.successful();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64
        };
        SummaryStats {
            total,
            successful,
            failed: total - successful,
            success_rate,
            latency: LatencyStats::from_samples(
                self.results
                    .iter()
                    .filter(|r| r.success)
                    .map(|r| r.response_time_seconds),
            ),
            faults: self.errors.len(),
        }
    }
}

/// Latency of successful requests, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub samples: usize,
}

impl LatencyStats {
    /// `None` when there are no samples.
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in samples {
            count += 1;
            sum += s;
            min = min.min(s);
            max = max.max(s);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            mean: sum / count as f64,
            max,
            samples: count,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Fraction in `[0, 1]`; 0 when there are no outcomes.
    pub success_rate: f64,
    pub latency: Option<LatencyStats>,
    pub faults: usize,
}

impl SummaryStats {
    pub fn success_rate_percent(&self) -> f64 {
        crate::utils::round_to(self.success_rate * 100.0, 1)
    }
}

/// Per-batch progress figures.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTally {
    pub batch: usize,
    pub items: usize,
    pub successful: usize,
    /// Failed outcomes plus faults.
    pub failed: usize,
    pub faults: usize,
    pub duration: Duration,
}

/// Exclusive owner of the run's [`ResultSet`].
///
/// Mutated only between batches, from the scheduler's control loop.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    set: ResultSet,
    tallies: Vec<BatchTally>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch's resolutions, in submission order.
    pub fn fold_batch(
        &mut self,
        batch: usize,
        resolutions: Vec<TaskResolution>,
        duration: Duration,
    ) -> BatchTally {
        let mut tally = BatchTally {
            batch,
            items: resolutions.len(),
            successful: 0,
            failed: 0,
            faults: 0,
            duration,
        };
        for resolution in resolutions {
            match resolution {
                TaskResolution::Fault(fault) => {
                    tally.failed += 1;
                    tally.faults += 1;
                    self.set.errors.push(fault);
                }
                TaskResolution::Outcome(outcome) => {
                    if outcome.success {
                        tally.successful += 1;
                    } else {
                        tally.failed += 1;
                    }
                    self.set.results.push(outcome);
                }
            }
        }
        self.tallies.push(tally.clone());
        tally
    }

    pub fn summary(&self) -> SummaryStats {
        self.set.summary()
    }

    pub fn result_set(&self) -> &ResultSet {
        &self.set
    }

    pub fn tallies(&self) -> &[BatchTally] {
        &self.tallies
    }

    pub fn into_parts(self) -> (ResultSet, Vec<BatchTally>) {
        (self.set, self.tallies)
    }
}
