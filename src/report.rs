//! Console summary and result persistence.

use crate::aggregate::{BatchFault, BatchTally, ResultSet, SummaryStats};
use crate::config::EndpointKind;
use crate::executor::RequestOutcome;
use crate::progress::RULE;
use crate::utils::{file_stamp, iso_now, iso_timestamp, round_to};
use chrono::Local;
use crate::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Complete in-memory record of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub endpoint: EndpointKind,
    pub batch_size: usize,
    pub base_url: String,
    pub results: ResultSet,
    pub tallies: Vec<BatchTally>,
    /// Wall-clock time of the whole dispatch phase.
    pub elapsed: Duration,
}

impl RunReport {
    pub fn summary(&self) -> SummaryStats {
        self.results.summary()
    }

    /// The persisted JSON document, stamped with `timestamp`.
    pub fn to_document(&self, timestamp: impl Into<String>) -> OutputDocument<'_> {
        OutputDocument {
            endpoint: self.endpoint,
            batch_size: self.batch_size,
            base_url: &self.base_url,
            timestamp: timestamp.into(),
            summary: PersistedSummary {
                total_requests: self.results.results.len(),
                successful: self.results.successful(),
                failed: self.results.failed(),
            },
            results: &self.results.results,
            errors: &self.results.errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedSummary {
    pub total_requests: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Output file schema.
#[derive(Debug, Serialize)]
pub struct OutputDocument<'a> {
    pub endpoint: EndpointKind,
    pub batch_size: usize,
    pub base_url: &'a str,
    pub timestamp: String,
    pub summary: PersistedSummary,
    pub results: &'a [RequestOutcome],
    pub errors: &'a [BatchFault],
}

/// `results_<endpoint>_<YYYYMMDD_HHMMSS>.json`
pub fn output_file_name(endpoint: EndpointKind, stamp: &str) -> String {
    format!("results_{}_{}.json", endpoint.name(), stamp)
}

/// Human-readable summary block.
pub fn render_summary(report: &RunReport) -> String {
    let stats = report.summary();
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "RESULTS SUMMARY");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Total time: {:.3}s", report.elapsed.as_secs_f64());
    let _ = writeln!(out, "Total requests: {}", stats.total);
    let _ = writeln!(out, "Successful: {}", stats.successful);
    let _ = writeln!(out, "Failed: {}", stats.failed);
    let _ = writeln!(out, "Success rate: {:.1}%", stats.success_rate_percent());
    if let Some(latency) = stats.latency {
        let _ = writeln!(out, "Average response time: {:.3}s", round_to(latency.mean, 3));
        let _ = writeln!(out, "Minimum time: {:.3}s", round_to(latency.min, 3));
        let _ = writeln!(out, "Maximum time: {:.3}s", round_to(latency.max, 3));
    }
    if stats.faults > 0 {
        let _ = writeln!(out, "Batch faults: {}", stats.faults);
    }
    out
}

/// Writes run documents to a directory.
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist `report` as pretty-printed JSON and return the file path.
    /// The file name and the document timestamp come from the same instant.
    pub async fn persist(&self, report: &RunReport) -> Result<PathBuf> {
        let now = Local::now();
        self.write(report, &file_stamp(&now), iso_timestamp(&now))
            .await
    }

    pub async fn persist_with_stamp(&self, report: &RunReport, stamp: &str) -> Result<PathBuf> {
        self.write(report, stamp, iso_now()).await
    }

    async fn write(&self, report: &RunReport, stamp: &str, timestamp: String) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(output_file_name(report.endpoint, stamp));
        let body = serde_json::to_vec_pretty(&report.to_document(timestamp))?;
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), results = report.results.results.len(), "results persisted");
        Ok(path)
    }
}
