//! extract-bench: 对 PDF 抽取接口进行批量压测的命令行工具
//!
//! Usage:
//!   extract-bench --endpoint main
//!   extract-bench --endpoint optmized --batch-size 25
//!   extract-bench --endpoint optmized-v2 --batch-size 10 --dataset data/dataset.json

use anyhow::Context;
use clap::Parser;
use extract_bench::progress::ConsoleProgressSink;
use extract_bench::report::render_summary;
use extract_bench::{BenchConfig, BenchRunner, EndpointKind, Reporter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "extract-bench", version)]
#[command(about = "Batch load test for the PDF extraction endpoints")]
struct Args {
    /// Endpoint to test: main, optmized or optmized-v2
    #[arg(long, value_parser = parse_endpoint)]
    endpoint: EndpointKind,

    /// Number of requests dispatched concurrently per batch
    #[arg(long, default_value_t = extract_bench::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Path to the dataset JSON file
    #[arg(long, default_value = "dataset.json")]
    dataset: PathBuf,

    /// Base URL of the extraction API (overrides EXTRACT_BENCH_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Directory the result file is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Per-request deadline in seconds (overrides EXTRACT_BENCH_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause between batches in milliseconds (overrides EXTRACT_BENCH_COOLDOWN_MS)
    #[arg(long)]
    cooldown_ms: Option<u64>,
}

impl Args {
    fn to_config(&self) -> BenchConfig {
        let mut config = BenchConfig::new(self.endpoint)
            .with_env_overrides()
            .with_batch_size(self.batch_size)
            .with_output_dir(self.output_dir.clone());
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.cooldown_ms {
            config = config.with_cooldown(Duration::from_millis(ms));
        }
        config
    }
}

fn parse_endpoint(s: &str) -> Result<EndpointKind, String> {
    s.parse::<EndpointKind>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tokio::select! {
        res = run(args) => match res {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("\nError during execution: {:#}", e);
                ExitCode::from(1)
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            println!("\nRun interrupted by user");
            ExitCode::SUCCESS
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.to_config();
    let reporter = Reporter::new(config.output_dir.clone());
    let runner = BenchRunner::new(config)
        .context("invalid configuration")?
        .with_progress_sink(Arc::new(ConsoleProgressSink::new()));

    let report = runner
        .run_dataset(&args.dataset)
        .await
        .with_context(|| format!("failed to run dataset {}", args.dataset.display()))?;

    print!("{}", render_summary(&report));

    let path = reporter
        .persist(&report)
        .await
        .context("failed to save results")?;
    println!("\nResults saved to: {}", path.display());
    Ok(())
}
