//! Run orchestration: configuration check, dataset load, batch scheduling.

use crate::batch::{BatchPlan, BatchScheduler};
use crate::config::BenchConfig;
use crate::dataset::{load_dataset, RequestItem};
use crate::executor::{Dispatch, RequestExecutor};
use crate::progress::{noop_sink, ProgressEvent, ProgressSink};
use crate::report::RunReport;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Drives one benchmark run.
///
/// Construction validates the configuration, so a runner that exists is ready
/// to dispatch.
pub struct BenchRunner {
    config: BenchConfig,
    dispatcher: Arc<dyn Dispatch>,
    progress: Arc<dyn ProgressSink>,
}

impl BenchRunner {
    /// Runner backed by the HTTP [`RequestExecutor`].
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let executor = RequestExecutor::new(&config)?;
        Ok(Self {
            config,
            dispatcher: Arc::new(executor),
            progress: noop_sink(),
        })
    }

    /// Runner backed by an arbitrary dispatcher.
    pub fn with_dispatcher(config: BenchConfig, dispatcher: Arc<dyn Dispatch>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher,
            progress: noop_sink(),
        })
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Load `path` and run it. Load errors surface before any request.
    pub async fn run_dataset(&self, path: impl AsRef<Path>) -> Result<RunReport> {
        self.announce();
        let items = load_dataset(path).await?;
        self.progress
            .report(&ProgressEvent::DatasetLoaded { items: items.len() });
        self.dispatch(items).await
    }

    /// Run an already loaded dataset.
    pub async fn run(&self, items: Vec<RequestItem>) -> Result<RunReport> {
        self.announce();
        self.dispatch(items).await
    }

    fn announce(&self) {
        info!(
            endpoint = %self.config.endpoint,
            batch_size = self.config.batch_size,
            url = %self.config.endpoint_url(),
            "starting run"
        );
        self.progress.report(&ProgressEvent::RunStarted {
            endpoint: self.config.endpoint,
            batch_size: self.config.batch_size,
            base_url: self.config.base_url.clone(),
        });
    }

    async fn dispatch(&self, items: Vec<RequestItem>) -> Result<RunReport> {
        let plan = BatchPlan::new(items, self.config.batch_size)?;
        self.progress.report(&ProgressEvent::Planned {
            items: plan.total_items(),
            batches: plan.len(),
        });

        let scheduled = BatchScheduler::new(Arc::clone(&self.dispatcher))
            .with_cooldown(self.config.cooldown)
            .with_progress_sink(Arc::clone(&self.progress))
            .run(plan)
            .await;

        Ok(RunReport {
            endpoint: self.config.endpoint,
            batch_size: self.config.batch_size,
            base_url: self.config.base_url.clone(),
            results: scheduled.results,
            tallies: scheduled.tallies,
            elapsed: scheduled.elapsed,
        })
    }
}
