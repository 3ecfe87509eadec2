use super::{ConnectionBudget, TransportError};
use crate::config::BenchConfig;
use crate::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Serialize;
use std::time::{Duration, Instant};

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
    /// When the response head arrived.
    pub received_at: Instant,
}

pub struct HttpTransport {
    client: reqwest::Client,
    budget: ConnectionBudget,
}

impl HttpTransport {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        // The per-request deadline is enforced by the executor; the client
        // timeout only backs it up.
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            budget: ConnectionBudget::new(config.max_connections, config.max_connections_per_host),
        })
    }

    pub fn budget(&self) -> &ConnectionBudget {
        &self.budget
    }

    /// POST `body` as JSON and read the full response text.
    ///
    /// Any status code is returned as a reply; only failures below the HTTP
    /// level are errors.
    pub async fn post_json<T>(&self, url: &Url, body: &T) -> std::result::Result<HttpReply, TransportError>
    where
        T: Serialize + ?Sized,
    {
        let host = url.host_str().unwrap_or_default();
        let _permit = self.budget.acquire(host).await?;

        let resp = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        let received_at = Instant::now();
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(HttpReply {
            status,
            body,
            received_at,
        })
    }
}
