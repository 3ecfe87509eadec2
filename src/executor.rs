//! 请求执行器：单条请求的发送、计时与结果分类。
//!
//! Request executor (single attempt, no retry).
//!
//! Classification, first match wins:
//! 1. deadline exceeded → `"TIMEOUT"`
//! 2. any other transport fault → `"ERROR"`
//! 3. response received → HTTP status, success iff it equals the expected status

use crate::config::BenchConfig;
use crate::dataset::{RequestItem, RequestSpec};
use crate::transport::{HttpReply, HttpTransport};
use crate::utils::{format_secs, iso_now, seconds_3dp};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Terminal label for requests that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailureKind {
    Timeout,
    Error,
}

/// `status_code` of an outcome: an HTTP status or a failure label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeStatus {
    Http(u16),
    Failed(FailureKind),
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Http(code) => write!(f, "{}", code),
            OutcomeStatus::Failed(FailureKind::Timeout) => f.write_str("TIMEOUT"),
            OutcomeStatus::Failed(FailureKind::Error) => f.write_str("ERROR"),
        }
    }
}

/// Result of one executed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub index: usize,
    /// Dataset `pdf_path`, before the prefix rewrite.
    pub pdf_file: String,
    pub label: String,
    pub status_code: OutcomeStatus,
    pub response_time_seconds: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<usize>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestOutcome {
    fn base(index: usize, item: &RequestItem, status: OutcomeStatus, elapsed: Duration) -> Self {
        Self {
            index,
            pdf_file: item.pdf_path.clone(),
            label: item.label.clone(),
            status_code: status,
            response_time_seconds: seconds_3dp(elapsed),
            success: false,
            response_size: None,
            timestamp: iso_now(),
            response_data: None,
            error: None,
        }
    }

    pub fn timeout(index: usize, item: &RequestItem, elapsed: Duration, deadline: Duration) -> Self {
        let mut outcome = Self::base(
            index,
            item,
            OutcomeStatus::Failed(FailureKind::Timeout),
            elapsed,
        );
        outcome.error = Some(format!("Request timeout ({}s)", format_secs(deadline)));
        outcome
    }

    pub fn transport_error(
        index: usize,
        item: &RequestItem,
        elapsed: Duration,
        message: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::base(index, item, OutcomeStatus::Failed(FailureKind::Error), elapsed);
        outcome.error = Some(message.into());
        outcome
    }

    /// Classify a received response. A success body that is not JSON is kept
    /// as a string; it never fails the outcome.
    pub fn from_reply(
        index: usize,
        item: &RequestItem,
        elapsed: Duration,
        reply: HttpReply,
        expected_status: u16,
    ) -> Self {
        let mut outcome = Self::base(index, item, OutcomeStatus::Http(reply.status), elapsed);
        outcome.success = reply.status == expected_status;
        outcome.response_size = Some(reply.body.chars().count());
        if outcome.success {
            outcome.response_data = Some(
                serde_json::from_str(&reply.body)
                    .unwrap_or(serde_json::Value::String(reply.body)),
            );
        } else {
            outcome.error = Some(reply.body);
        }
        outcome
    }
}

/// Per-item dispatch seam used by the batch scheduler.
///
/// Implementations must resolve every call to an outcome; a panic inside
/// `dispatch` is treated by the scheduler as a batch fault.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, index: usize, item: RequestItem) -> RequestOutcome;
}

/// Issues one POST per item against the configured endpoint.
pub struct RequestExecutor {
    transport: HttpTransport,
    url: Url,
    pdf_prefix: String,
    request_timeout: Duration,
    expected_status: u16,
}

impl RequestExecutor {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let endpoint_url = config.endpoint_url();
        let url = Url::parse(&endpoint_url).map_err(|e| {
            Error::configuration_with_context(
                "endpoint URL is not valid",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", endpoint_url, e))
                    .with_source("executor"),
            )
        })?;
        Ok(Self {
            transport: HttpTransport::new(config)?,
            url,
            pdf_prefix: config.pdf_prefix.clone(),
            request_timeout: config.request_timeout,
            expected_status: config.expected_status,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Execute one request. Never fails: every fault becomes an outcome.
    pub async fn execute(&self, index: usize, item: &RequestItem) -> RequestOutcome {
        let spec = RequestSpec::from_item(item, &self.pdf_prefix);
        let start = Instant::now();
        let attempt =
            tokio::time::timeout(self.request_timeout, self.transport.post_json(&self.url, &spec))
                .await;

        let outcome = match attempt {
            Err(_) => RequestOutcome::timeout(index, item, start.elapsed(), self.request_timeout),
            Ok(Err(e)) if e.is_timeout() => {
                RequestOutcome::timeout(index, item, start.elapsed(), self.request_timeout)
            }
            Ok(Err(e)) => RequestOutcome::transport_error(index, item, start.elapsed(), e.describe()),
            Ok(Ok(reply)) => {
                let elapsed = reply.received_at.saturating_duration_since(start);
                RequestOutcome::from_reply(index, item, elapsed, reply, self.expected_status)
            }
        };

        debug!(
            index,
            status = %outcome.status_code,
            success = outcome.success,
            response_time_seconds = outcome.response_time_seconds,
            "request resolved"
        );
        outcome
    }
}

#[async_trait]
impl Dispatch for RequestExecutor {
    async fn dispatch(&self, index: usize, item: RequestItem) -> RequestOutcome {
        self.execute(index, &item).await
    }
}
