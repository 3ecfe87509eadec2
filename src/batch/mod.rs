//! 批处理模块：数据集分批与按批并发调度。
//!
//! # Batch Module
//!
//! Partitions the dataset into fixed-size batches and dispatches them.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchPlan`] | Ordered, gap-free partition of the dataset |
//! | [`Batch`] | One slice of `(index, item)` pairs |
//! | [`BatchScheduler`] | Sequential batches, concurrent items, cooldown between batches |
//! | [`ScheduledRun`] | Result set, per-batch tallies and elapsed time of a run |
//!
//! ## Example
//!
//! ```rust
//! use extract_bench::batch::BatchPlan;
//! use extract_bench::dataset::RequestItem;
//!
//! let items: Vec<RequestItem> = (0..3)
//!     .map(|i| RequestItem {
//!         label: "doc".to_string(),
//!         extraction_schema: serde_json::json!({}),
//!         pdf_path: format!("{}.pdf", i),
//!     })
//!     .collect();
//!
//! let plan = BatchPlan::new(items, 2).unwrap();
//! assert_eq!(plan.batch_sizes(), vec![2, 1]);
//! ```
//!
//! ## Concurrency
//!
//! Batch size is the concurrency unit: every item of a batch is in flight at
//! once, subject to the transport's connection budget. Batch `k + 1` starts
//! only after every task of batch `k` has resolved.

mod plan;
mod scheduler;

pub use plan::{batch_count, Batch, BatchPlan};
pub use scheduler::{BatchScheduler, ScheduledRun};
