//! 运行配置：端点选择、批大小、超时、冷却与连接预算。
//!
//! Run configuration for the benchmark harness.
//!
//! Defaults match the extraction service's local deployment. Every knob can be
//! overridden through the environment (see [`BenchConfig::with_env_overrides`])
//! and then again through the CLI.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3004/api";
pub const DEFAULT_PDF_PREFIX: &str = "../pdfs";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 50;
pub const EXPECTED_SUCCESS_STATUS: u16 = 201;

pub const ENV_BASE_URL: &str = "EXTRACT_BENCH_BASE_URL";
pub const ENV_PDF_PREFIX: &str = "EXTRACT_BENCH_PDF_PREFIX";
pub const ENV_TIMEOUT_SECS: &str = "EXTRACT_BENCH_TIMEOUT_SECS";
pub const ENV_COOLDOWN_MS: &str = "EXTRACT_BENCH_COOLDOWN_MS";
pub const ENV_MAX_CONNECTIONS: &str = "EXTRACT_BENCH_MAX_CONNECTIONS";
pub const ENV_MAX_PER_HOST: &str = "EXTRACT_BENCH_MAX_PER_HOST";

/// Extraction endpoint under test.
///
/// The external names keep the service's historical spelling (`optmized`),
/// while the `optmized-v2` selection routes to `/extract/optimized-v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "optmized")]
    Optmized,
    #[serde(rename = "optmized-v2")]
    OptmizedV2,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 3] = [
        EndpointKind::Main,
        EndpointKind::Optmized,
        EndpointKind::OptmizedV2,
    ];

    /// Selection name as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            EndpointKind::Main => "main",
            EndpointKind::Optmized => "optmized",
            EndpointKind::OptmizedV2 => "optmized-v2",
        }
    }

    /// Path appended to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            EndpointKind::Main => "/extract/main",
            EndpointKind::Optmized => "/extract/optmized",
            EndpointKind::OptmizedV2 => "/extract/optimized-v2",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EndpointKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EndpointKind::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = EndpointKind::ALL.iter().map(|e| e.name()).collect();
                Error::configuration_with_context(
                    format!("invalid endpoint '{}'", s),
                    ErrorContext::new()
                        .with_field_path("endpoint")
                        .with_details(format!("use one of: {}", valid.join(", ")))
                        .with_source("config"),
                )
            })
    }
}

/// Configuration for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub endpoint: EndpointKind,
    pub batch_size: usize,
    pub base_url: String,
    /// Prefix joined in front of every dataset `pdf_path`.
    pub pdf_prefix: String,
    /// Per-request deadline (connection wait, send and body read).
    pub request_timeout: Duration,
    /// Idle time between two batches.
    pub cooldown: Duration,
    /// Global ceiling on concurrent connections across the run.
    pub max_connections: usize,
    /// Ceiling on concurrent connections to a single host.
    pub max_connections_per_host: usize,
    pub expected_status: u16,
    /// Directory the result document is written to.
    pub output_dir: PathBuf,
}

impl BenchConfig {
    pub fn new(endpoint: EndpointKind) -> Self {
        Self {
            endpoint,
            batch_size: DEFAULT_BATCH_SIZE,
            base_url: DEFAULT_BASE_URL.to_string(),
            pdf_prefix: DEFAULT_PDF_PREFIX.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cooldown: DEFAULT_COOLDOWN,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            expected_status: EXPECTED_SUCCESS_STATUS,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_pdf_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pdf_prefix = prefix.into();
        self
    }

    pub fn with_request_timeout(mut self, d: Duration) -> Self {
        self.request_timeout = d;
        self
    }

    pub fn with_cooldown(mut self, d: Duration) -> Self {
        self.cooldown = d;
        self
    }

    pub fn with_max_connections(mut self, n: usize) -> Self {
        self.max_connections = n;
        self
    }

    pub fn with_max_connections_per_host(mut self, n: usize) -> Self {
        self.max_connections_per_host = n;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Apply `EXTRACT_BENCH_*` environment overrides.
    ///
    /// - `EXTRACT_BENCH_BASE_URL`
    /// - `EXTRACT_BENCH_PDF_PREFIX`
    /// - `EXTRACT_BENCH_TIMEOUT_SECS` (default 120)
    /// - `EXTRACT_BENCH_COOLDOWN_MS` (default 1000)
    /// - `EXTRACT_BENCH_MAX_CONNECTIONS` (default 100)
    /// - `EXTRACT_BENCH_MAX_PER_HOST` (default 50)
    ///
    /// Values that fail to parse are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(prefix) = lookup(ENV_PDF_PREFIX) {
            self.pdf_prefix = prefix;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.trim().parse::<u64>().ok()) {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = lookup(ENV_COOLDOWN_MS).and_then(|s| s.trim().parse::<u64>().ok()) {
            self.cooldown = Duration::from_millis(ms);
        }
        if let Some(n) = lookup(ENV_MAX_CONNECTIONS).and_then(|s| s.trim().parse::<usize>().ok()) {
            self.max_connections = n;
        }
        if let Some(n) = lookup(ENV_MAX_PER_HOST).and_then(|s| s.trim().parse::<usize>().ok()) {
            self.max_connections_per_host = n;
        }
        self
    }

    /// Reject configurations that cannot drive a run. Called before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "batch size must be a positive integer", "got 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid(
                "request_timeout",
                "request timeout must be greater than zero",
                "got 0s",
            ));
        }
        if self.max_connections == 0 {
            return Err(invalid(
                "max_connections",
                "connection ceiling must be positive",
                "got 0",
            ));
        }
        if self.max_connections_per_host == 0 {
            return Err(invalid(
                "max_connections_per_host",
                "per-host connection ceiling must be positive",
                "got 0",
            ));
        }
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            invalid("base_url", "base URL is not a valid URL", &format!("{}: {}", self.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(
                "base_url",
                "base URL must use http or https",
                parsed.scheme(),
            ));
        }
        Ok(())
    }

    /// Full URL of the endpoint under test.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint.path())
    }
}

fn invalid(field: &str, msg: &str, details: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("config"),
    )
}
