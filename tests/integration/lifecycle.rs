//! Background polling seen through the probe server

use std::sync::Arc;
use std::time::Duration;

use healthz::{Inspector, LifecycleState};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

/// Recovery of a dependency shows up on the next cycle
#[tokio::test]
async fn test_ready_recovers_after_dependency_heals() {
    let (database, _, targets) = demo_targets();
    let inspector = Arc::new(
        Inspector::new(targets)
            .with_check_period(Duration::from_millis(50))
            .unwrap(),
    );
    let server = TestServer::spawn(&inspector, None, None).await;

    let ctx = CancellationToken::new();
    inspector.start(ctx.child_token());
    assert_eq!(inspector.state(), LifecycleState::Running);

    let first = Arc::clone(&inspector);
    wait_until(Duration::from_secs(5), move || {
        first.snapshot().checked_at().is_some()
    })
    .await;

    let resp = server.get("/healthz/ready").await;
    assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);

    database.set_healthy(true);
    let healed = Arc::clone(&inspector);
    wait_until(Duration::from_secs(5), move || {
        healed.check_group(healthz::ProbeGroup::READY, true).is_ok()
    })
    .await;

    let resp = server.get("/healthz/ready").await;
    assert_status(&resp, StatusCode::OK);

    inspector.stop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(inspector.state(), LifecycleState::Stopped);
    server.stop().await;
}

/// Cancelling the parent context stops polling and the server keeps
/// answering from the last snapshot
#[tokio::test]
async fn test_context_cancel_freezes_snapshot() {
    let (database, _, targets) = demo_targets();
    let inspector = Arc::new(
        Inspector::new(targets)
            .with_check_period(Duration::from_millis(20))
            .unwrap(),
    );
    let server = TestServer::spawn(&inspector, None, None).await;

    let ctx = CancellationToken::new();
    inspector.start(ctx.child_token());

    let polled = Arc::clone(&inspector);
    wait_until(Duration::from_secs(5), move || {
        polled.snapshot().checked_at().is_some()
    })
    .await;

    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(5), inspector.stopped())
        .await
        .expect("Loop did not stop after cancellation");

    database.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let resp = server.get("/healthz/ready").await;
    assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);

    server.stop().await;
}
