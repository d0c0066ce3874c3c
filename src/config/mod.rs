//! Configuration loaded from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthz::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Probe address: {}", config.server.listen_addr);
//! println!("Check period: {:?}", config.health.check_period);
//! ```

mod error;
mod health;
mod logging;
mod parse;
mod server;

pub use error::ConfigError;
pub use health::{HealthConfig, DEFAULT_SHUTDOWN_TIMEOUT};
pub use logging::{LogFormat, LoggingConfig};
pub use parse::parse_duration;
pub use server::ServerConfig;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Polling configuration.
    pub health: HealthConfig,
    /// Probe server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            health: HealthConfig::from_env()?,
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Listen: {}", self.server.listen_addr);
        info!("  Check period: {:?}", self.health.check_period);
        info!("  Shutdown timeout: {:?}", self.health.shutdown_timeout);
        info!("  Log format: {:?}", self.logging.format);

        if self.server.json_body {
            info!("  Probe body: json");
        }

        if self.server.inverted_status {
            info!("  Status convention: inverted (503 = healthy)");
        }
    }
}
