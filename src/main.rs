use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prometheus::{Opts, Registry};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use healthz::config::Config;
use healthz::health::health_gauge;
use healthz::server::{ProbeRouter, ResponseFormatter, StatusConvention};
use healthz::{CheckError, HealthCheckTarget, HealthCheckable, Inspector, ProbeGroup};

/// Dependency with a fixed answer.
struct StaticDependency {
    scope: &'static str,
    dest: &'static str,
    failure: Option<&'static str>,
}

#[async_trait]
impl HealthCheckable for StaticDependency {
    async fn health(&self, _cancel: &CancellationToken) -> Result<(), CheckError> {
        match self.failure {
            None => Ok(()),
            Some(reason) => Err(reason.into()),
        }
    }

    fn scope(&self) -> &str {
        self.scope
    }

    fn dest(&self) -> &str {
        self.dest
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    healthz::logging::init(&config.logging)?;

    info!(
        "Starting healthz {} {}",
        healthz::PKG_VERSION,
        healthz::BUILD_VERSION
    );
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let targets = vec![
        HealthCheckTarget::new(
            Arc::new(StaticDependency {
                scope: "database",
                dest: "host-1:5432/db_1",
                failure: Some("some err"),
            }),
            ProbeGroup::READY,
        ),
        HealthCheckTarget::new(
            Arc::new(StaticDependency {
                scope: "kafka",
                dest: "host-1:8431",
                failure: None,
            }),
            ProbeGroup::ALL,
        ),
    ];

    let gauge = health_gauge(
        Opts::new("service_up", "Dependency health, 1 healthy / 0 unhealthy")
            .const_label("foo", "bar"),
    )?;
    let registry = Registry::new();
    registry.register(Box::new(gauge.clone()))?;

    let inspector = Arc::new(
        Inspector::new(targets)
            .with_check_period(config.health.check_period)?
            .with_metric(Some(Arc::new(gauge)))?,
    );

    let shutdown = CancellationToken::new();
    inspector.start(shutdown.child_token());

    let formatter = config.server.json_body.then(ResponseFormatter::json);
    let convention = if config.server.inverted_status {
        StatusConvention::Inverted
    } else {
        StatusConvention::Standard
    };
    let router = Arc::new(
        ProbeRouter::standard(&inspector, formatter)
            .with_status_convention(convention)
            .with_registry(registry),
    );

    let listener = TcpListener::bind(config.server.listen_addr).await?;
    info!("Probe server listening on {}", config.server.listen_addr);

    let server = tokio::spawn(Arc::clone(&router).serve(listener, shutdown.clone()));

    shutdown_signal().await;
    info!("Shutting down...");

    if let Err(e) = inspector.stop(config.health.shutdown_timeout).await {
        warn!("Inspector shutdown: {}", e);
    }
    shutdown.cancel();

    match tokio::time::timeout(Duration::from_secs(1), server).await {
        Ok(Ok(Err(e))) => error!("Probe server error: {}", e),
        Ok(Err(e)) => error!("Probe server task failed: {}", e),
        Ok(Ok(Ok(()))) | Err(_) => {}
    }

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
