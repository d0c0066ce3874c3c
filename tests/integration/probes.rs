//! Probe endpoint tests (/healthz/startup, /healthz/live, /healthz/ready)

use std::sync::Arc;

use healthz::server::ResponseFormatter;
use healthz::Inspector;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

async fn polled_inspector() -> Arc<Inspector> {
    let (_, _, targets) = demo_targets();
    let inspector = Arc::new(Inspector::new(targets));
    inspector.poll(&CancellationToken::new()).await;
    inspector
}

/// Startup and live pass because the broker is healthy
#[tokio::test]
async fn test_any_policy_probes() {
    let server = TestServer::spawn(&polled_inspector().await, None, None).await;

    let resp = server.get("/healthz/startup").await;
    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let resp = server.get("/healthz/live").await;
    assert_status(&resp, StatusCode::OK);

    server.stop().await;
}

/// Ready fails because the database is down
#[tokio::test]
async fn test_ready_requires_all() {
    let server = TestServer::spawn(&polled_inspector().await, None, None).await;

    let resp = server.get("/healthz/ready").await;
    assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);
    assert_header_starts_with(&resp, "content-type", "text/plain");
    assert_eq!(resp.text().await.unwrap(), "Unhealthy");

    server.stop().await;
}

/// Every probe fails before the first poll
#[tokio::test]
async fn test_unhealthy_before_first_poll() {
    let (_, _, targets) = demo_targets();
    let inspector = Arc::new(Inspector::new(targets));
    let server = TestServer::spawn(&inspector, None, None).await;

    for path in ["/healthz/startup", "/healthz/live", "/healthz/ready"] {
        let resp = server.get(path).await;
        assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);
    }

    server.stop().await;
}

/// JSON formatter lists the failure reason
#[tokio::test]
async fn test_json_body() {
    let inspector = polled_inspector().await;
    let server = TestServer::spawn(&inspector, None, Some(ResponseFormatter::json())).await;

    let resp = server.get("/healthz/ready").await;
    assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);
    assert_header_starts_with(&resp, "content-type", "application/json");

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["errors"][0], "database host-1:5432/db_1 unreachable");

    let resp = server.get("/healthz/live").await;
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.stop().await;
}

/// Method is ignored
#[tokio::test]
async fn test_post_is_answered() {
    let server = TestServer::spawn(&polled_inspector().await, None, None).await;

    let resp = server
        .client
        .post(format!("{}/healthz/live", server.base_url))
        .body("ignored")
        .send()
        .await
        .unwrap();
    assert_status(&resp, StatusCode::OK);

    server.stop().await;
}

/// Unknown paths return 404
#[tokio::test]
async fn test_unknown_path() {
    let server = TestServer::spawn(&polled_inspector().await, None, None).await;

    let resp = server.get("/healthz").await;
    assert_status(&resp, StatusCode::NOT_FOUND);

    server.stop().await;
}
