//! Outcome classification against real sockets

use crate::mock_server::{items, refused_base_url, MockServerFixture, StalledEndpoint};
use extract_bench::executor::{FailureKind, OutcomeStatus};
use extract_bench::{BenchConfig, EndpointKind, RequestExecutor};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_created_response_is_success_with_parsed_body() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_response(
            EndpointKind::Main,
            201,
            r#"{"data":{"nome":"JOANA D'ARC"},"cache":{"hit":false}}"#,
            1,
        )
        .await;

    let executor = RequestExecutor::new(&fixture.config(EndpointKind::Main)).unwrap();
    let dataset = items(1);
    let outcome = executor.execute(7, &dataset[0]).await;

    mock.assert_async().await;
    assert!(outcome.success);
    assert_eq!(outcome.index, 7);
    assert_eq!(outcome.pdf_file, "oab_0.pdf");
    assert_eq!(outcome.label, "carteira_oab");
    assert_eq!(outcome.status_code, OutcomeStatus::Http(201));
    assert_eq!(
        outcome.response_data,
        Some(json!({"data": {"nome": "JOANA D'ARC"}, "cache": {"hit": false}}))
    );
    assert!(outcome.error.is_none());
    assert!(outcome.response_time_seconds >= 0.0);
}

#[tokio::test]
async fn test_payload_carries_prefixed_pdf_path() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_for_pdf(EndpointKind::OptmizedV2, "../pdfs/oab_0.pdf", 201)
        .await;

    let executor = RequestExecutor::new(&fixture.config(EndpointKind::OptmizedV2)).unwrap();
    let outcome = executor.execute(0, &items(1)[0]).await;

    mock.assert_async().await;
    assert!(outcome.success);
    // the outcome reports the dataset path, not the rewritten one
    assert_eq!(outcome.pdf_file, "oab_0.pdf");
}

#[tokio::test]
async fn test_server_error_is_failure_with_body_as_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_response(
            EndpointKind::Optmized,
            500,
            r#"{"statusCode":500,"message":"Internal server error"}"#,
            1,
        )
        .await;

    let executor = RequestExecutor::new(&fixture.config(EndpointKind::Optmized)).unwrap();
    let outcome = executor.execute(0, &items(1)[0]).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status_code, OutcomeStatus::Http(500));
    assert_eq!(
        outcome.error.as_deref(),
        Some(r#"{"statusCode":500,"message":"Internal server error"}"#)
    );
    assert!(outcome.response_data.is_none());
    assert_eq!(outcome.response_size, Some(52));
}

#[tokio::test]
async fn test_created_with_non_json_body_keeps_raw_text() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_response(EndpointKind::Main, 201, "created", 1)
        .await;

    let executor = RequestExecutor::new(&fixture.config(EndpointKind::Main)).unwrap();
    let outcome = executor.execute(0, &items(1)[0]).await;

    assert!(outcome.success);
    assert_eq!(outcome.response_data, Some(json!("created")));
}

#[tokio::test]
async fn test_stalled_endpoint_times_out() {
    let stalled = StalledEndpoint::start().await;
    let config = BenchConfig::new(EndpointKind::Main)
        .with_base_url(stalled.base_url())
        .with_request_timeout(Duration::from_millis(300));

    let executor = RequestExecutor::new(&config).unwrap();
    let outcome = executor.execute(0, &items(1)[0]).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status_code, OutcomeStatus::Failed(FailureKind::Timeout));
    assert_eq!(outcome.error.as_deref(), Some("Request timeout (0.3s)"));
    assert!(
        outcome.response_time_seconds >= 0.29 && outcome.response_time_seconds < 5.0,
        "response time {} should be close to the deadline",
        outcome.response_time_seconds
    );
    assert!(outcome.response_size.is_none());
}

#[tokio::test]
async fn test_refused_connection_is_error() {
    let config = BenchConfig::new(EndpointKind::Main)
        .with_base_url(refused_base_url().await)
        .with_request_timeout(Duration::from_secs(10));

    let executor = RequestExecutor::new(&config).unwrap();
    let outcome = executor.execute(0, &items(1)[0]).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status_code, OutcomeStatus::Failed(FailureKind::Error));
    assert!(!outcome.error.unwrap_or_default().is_empty());
    assert!(outcome.response_time_seconds >= 0.0);
}
