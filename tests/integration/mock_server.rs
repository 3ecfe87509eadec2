//! Mock HTTP endpoints and dataset fixtures for integration tests

use extract_bench::{BenchConfig, EndpointKind, RequestItem};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Test fixture that manages a mock extraction API
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    /// Base URL including the `/api` prefix, like the real deployment
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/api", server.url());
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Config pointing at the mock server, with no cooldown
    pub fn config(&self, endpoint: EndpointKind) -> BenchConfig {
        BenchConfig::new(endpoint)
            .with_base_url(&self.base_url)
            .with_cooldown(Duration::ZERO)
    }

    /// Create a mock answering every POST on `endpoint` with `status` and `body`
    pub async fn mock_response(
        &self,
        endpoint: EndpointKind,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", format!("/api{}", endpoint.path()).as_str())
            .match_header("content-type", "application/json")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock that only matches a request carrying the rewritten pdf path
    pub async fn mock_for_pdf(&self, endpoint: EndpointKind, pdf_path: &str, status: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", format!("/api{}", endpoint.path()).as_str())
            .match_body(Matcher::PartialJson(json!({ "pdf_path": pdf_path })))
            .with_status(status)
            .with_body(r#"{"data":{}}"#)
            .expect(1)
            .create_async()
            .await
    }
}

/// A listener that accepts connections and never answers
pub struct StalledEndpoint {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StalledEndpoint {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

impl Drop for StalledEndpoint {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a local port nobody listens on
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

pub fn items(n: usize) -> Vec<RequestItem> {
    (0..n)
        .map(|i| RequestItem {
            label: "carteira_oab".to_string(),
            extraction_schema: json!({
                "nome": "Nome do profissional",
                "inscricao": "Número de inscrição"
            }),
            pdf_path: format!("oab_{}.pdf", i),
        })
        .collect()
}
