//! # extract-bench
//!
//! 面向 PDF 抽取接口的批量压测客户端。
//!
//! Batch load-testing client for the PDF extraction endpoints.
//!
//! ## Overview
//!
//! A dataset of extraction requests is replayed against one endpoint in
//! fixed-size batches. Batches run one after another; the requests of a batch
//! run concurrently over a shared, bounded connection pool. Every request is
//! timed and classified, the outcomes are folded into a result log, and the
//! run ends with a console summary and a JSON result file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extract_bench::{BenchConfig, BenchRunner, EndpointKind, Reporter};
//!
//! #[tokio::main]
//! async fn main() -> extract_bench::Result<()> {
//!     let config = BenchConfig::new(EndpointKind::Main).with_batch_size(25);
//!     let runner = BenchRunner::new(config)?;
//!     let report = runner.run_dataset("dataset.json").await?;
//!
//!     print!("{}", extract_bench::report::render_summary(&report));
//!     Reporter::new(".").persist(&report).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Endpoint selection, batch size, deadlines, connection budget |
//! | [`dataset`] | Dataset loading and request payload derivation |
//! | [`executor`] | Single-request execution and outcome classification |
//! | [`batch`] | Batch partitioning and sequential batch scheduling |
//! | [`aggregate`] | Result/fault logs and summary statistics |
//! | [`report`] | Console summary and result file |
//! | [`progress`] | Progress event sinks |
//! | [`transport`] | Shared HTTP client and connection budget |

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod executor;
pub mod progress;
pub mod report;
pub mod runner;
pub mod transport;
pub mod utils;

pub use aggregate::{BatchFault, ResultSet, SummaryStats};
pub use config::{BenchConfig, EndpointKind};
pub use dataset::RequestItem;
pub use executor::{Dispatch, RequestExecutor, RequestOutcome};
pub use report::{Reporter, RunReport};
pub use runner::BenchRunner;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
