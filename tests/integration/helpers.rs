//! Test helpers and utilities

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use healthz::server::{ProbeRouter, ResponseFormatter};
use healthz::{CheckError, HealthCheckTarget, HealthCheckable, Inspector, ProbeGroup};
use prometheus::{GaugeVec, Opts, Registry};
use reqwest::{Client, Response, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Dependency whose health can be flipped at runtime.
pub struct Dependency {
    scope: &'static str,
    dest: &'static str,
    healthy: AtomicBool,
}

impl Dependency {
    pub fn new(scope: &'static str, dest: &'static str, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            scope,
            dest,
            healthy: AtomicBool::new(healthy),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthCheckable for Dependency {
    async fn health(&self, _cancel: &CancellationToken) -> Result<(), CheckError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(format!("{} {} unreachable", self.scope, self.dest).into())
        }
    }

    fn scope(&self) -> &str {
        self.scope
    }

    fn dest(&self) -> &str {
        self.dest
    }
}

/// Failing database gating readiness, healthy broker in every group.
pub fn demo_targets() -> (Arc<Dependency>, Arc<Dependency>, Vec<HealthCheckTarget>) {
    let database = Dependency::new("database", "host-1:5432/db_1", false);
    let kafka = Dependency::new("kafka", "host-1:8431", true);
    let targets = vec![
        HealthCheckTarget::new(database.clone(), ProbeGroup::READY),
        HealthCheckTarget::new(kafka.clone(), ProbeGroup::ALL),
    ];
    (database, kafka, targets)
}

/// `service_up{foo="bar"}` gauge registered in a fresh registry.
pub fn service_up_gauge() -> (GaugeVec, Registry) {
    let gauge = healthz::health::health_gauge(
        Opts::new("service_up", "Dependency health, 1 healthy / 0 unhealthy")
            .const_label("foo", "bar"),
    )
    .expect("Failed to create gauge");
    let registry = Registry::new();
    registry
        .register(Box::new(gauge.clone()))
        .expect("Failed to register gauge");
    (gauge, registry)
}

/// Probe server bound to an ephemeral local port
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the standard probe routes for `inspector`
    pub async fn spawn(
        inspector: &Arc<Inspector>,
        registry: Option<Registry>,
        formatter: Option<ResponseFormatter>,
    ) -> Self {
        let mut router = ProbeRouter::standard(inspector, formatter);
        if let Some(registry) = registry {
            router = router.with_registry(registry);
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind probe listener");
        let addr = listener.local_addr().expect("No local address");

        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            Arc::new(router)
                .serve(listener, server_shutdown)
                .await
                .expect("Probe server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", addr),
            client,
            shutdown,
            handle,
        }
    }

    /// Make a GET request to the server
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Stop accepting connections and wait for the accept loop to exit
    pub async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("Probe server did not stop")
            .expect("Probe server task panicked");
    }
}

/// Assert that response has expected status
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that response contains header with prefix
pub fn assert_header_starts_with(response: &Response, name: &str, prefix: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .unwrap();
    assert!(
        value.starts_with(prefix),
        "Header '{}' expected to start with '{}', got '{}'",
        name,
        prefix,
        value
    );
}

/// Poll `cond` until it holds or `timeout` elapses
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Condition not met after {:?}", timeout);
}
