//! /metrics endpoint tests

use std::sync::Arc;

use healthz::Inspector;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

/// One series per dependency, 1 for healthy and 0 for failing
#[tokio::test]
async fn test_metrics_per_dependency() {
    let (_, _, targets) = demo_targets();
    let (gauge, registry) = service_up_gauge();
    let inspector = Arc::new(
        Inspector::new(targets)
            .with_metric(Some(Arc::new(gauge)))
            .expect("Gauge labels should be accepted"),
    );
    inspector.poll(&CancellationToken::new()).await;

    let server = TestServer::spawn(&inspector, Some(registry), None).await;
    let resp = server.get("/metrics").await;
    assert_status(&resp, StatusCode::OK);
    assert_header_starts_with(&resp, "content-type", "text/plain");

    let body = resp.text().await.unwrap();
    assert!(body.contains("# TYPE service_up gauge"), "body: {}", body);
    assert!(
        body.contains(r#"service_up{dest="host-1:5432/db_1",foo="bar",scope="database"} 0"#),
        "body: {}",
        body
    );
    assert!(
        body.contains(r#"service_up{dest="host-1:8431",foo="bar",scope="kafka"} 1"#),
        "body: {}",
        body
    );

    server.stop().await;
}

/// Without a registry the endpoint does not exist
#[tokio::test]
async fn test_metrics_not_configured() {
    let (_, _, targets) = demo_targets();
    let inspector = Arc::new(Inspector::new(targets));
    let server = TestServer::spawn(&inspector, None, None).await;

    let resp = server.get("/metrics").await;
    assert_status(&resp, StatusCode::NOT_FOUND);

    server.stop().await;
}
