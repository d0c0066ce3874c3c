//! Probe server configuration.

use std::net::SocketAddr;

use super::parse::{env_bool, env_or};
use super::ConfigError;

/// Probe server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address for probes and metrics (HEALTHZ_ADDR).
    pub listen_addr: SocketAddr,
    /// Render probe bodies as JSON (HEALTHZ_JSON_BODY).
    pub json_body: bool,
    /// Answer 503 for healthy and 200 for unhealthy (HEALTHZ_INVERTED_STATUS).
    pub inverted_status: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr_str = env_or("HEALTHZ_ADDR", "0.0.0.0:6060");
        let listen_addr = addr_str.parse().map_err(|e| ConfigError::Parse {
            key: "HEALTHZ_ADDR".into(),
            value: addr_str.clone(),
            error: format!("{}", e),
        })?;

        Ok(Self {
            listen_addr,
            json_body: env_bool("HEALTHZ_JSON_BODY", false),
            inverted_status: env_bool("HEALTHZ_INVERTED_STATUS", false),
        })
    }
}
