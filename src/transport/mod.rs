//! HTTP transport shared by every in-flight request of a run.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`HttpTransport`] | Pooled `reqwest` client gated by a connection budget |
//! | [`ConnectionBudget`] | Global and per-host ceilings on concurrent connections |
//! | [`TransportError`] | Failures below the HTTP status level |

mod budget;
mod http;

pub use budget::{BudgetPermit, BudgetSnapshot, ConnectionBudget};
pub use http::{HttpReply, HttpTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection budget error: {0}")]
    Budget(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure was the client-side deadline firing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }

    /// Error message followed by its source chain, e.g.
    /// `error sending request for url (...): tcp connect error: Connection refused`.
    pub fn describe(&self) -> String {
        let mut out = match self {
            TransportError::Http(e) => e.to_string(),
            TransportError::Budget(m) | TransportError::Other(m) => m.clone(),
        };
        let mut source = match self {
            TransportError::Http(e) => std::error::Error::source(e),
            _ => None,
        };
        while let Some(err) = source {
            let msg = err.to_string();
            if !out.contains(&msg) {
                out.push_str(": ");
                out.push_str(&msg);
            }
            source = err.source();
        }
        out
    }
}
