//! Exporter configuration
//!
//! Listen address, port, and metrics path are process-wide and fixed at
//! startup; everything target-specific arrives per request.

use ilo_core::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Process-wide exporter configuration
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Listen address
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Path that serves the metrics payload
    pub endpoint: String,

    /// Maximum number of concurrently handled requests
    pub max_connections: usize,

    /// Per-request ceiling; a scrape still in flight at this point is
    /// abandoned and the connection released
    pub request_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9416,
            endpoint: "/metrics".to_string(),
            max_connections: 30,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ExporterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.address.parse::<IpAddr>().is_err() {
            return Err(Error::config(format!(
                "listen address is not an IP address: {}",
                self.address
            )));
        }
        if !self.endpoint.starts_with('/') {
            return Err(Error::config(format!(
                "metrics path must start with '/': {}",
                self.endpoint
            )));
        }
        if self.endpoint == "/" {
            return Err(Error::config(
                "metrics path must not shadow the informational root",
            ));
        }
        if self.max_connections == 0 {
            return Err(Error::config("max connections must be greater than zero"));
        }
        Ok(())
    }

    /// The socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .address
            .parse()
            .map_err(|_| Error::config(format!("invalid listen address: {}", self.address)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
