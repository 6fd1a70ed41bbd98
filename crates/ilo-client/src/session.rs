//! HTTP controller session
//!
//! Drives the controller's JSON data-retrieval API over HTTPS. Legacy
//! controller firmware ships outdated TLS stacks and self-signed
//! certificates, so the permissive policy disables certificate and
//! host-name verification for the session. Sessions are opened fresh per
//! request and never pooled.

use crate::Controller;
use async_trait::async_trait;
use ilo_core::{Error, IloTarget, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Transport security policy for the controller session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Accept invalid certificates and host names. Required for legacy
    /// controller firmware with outdated TLS stacks.
    Permissive,
    /// Full certificate and host-name verification
    Strict,
}

/// Configuration for opening a controller session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Per-call timeout applied to every controller round-trip
    pub timeout: Duration,

    /// Transport security policy
    pub tls: TlsPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            tls: TlsPolicy::Permissive,
        }
    }
}

/// An authenticated session against one controller
#[derive(Debug)]
pub struct HttpController {
    client: Client,
    base_url: String,
    session_key: String,
}

impl HttpController {
    /// Open a session: build the TLS client and perform the login
    /// round-trip against the resolved target.
    pub async fn open_session(target: &IloTarget, config: &SessionConfig) -> Result<Self> {
        debug!(host = %target.host, port = target.port, "opening controller session");

        let mut builder = Client::builder().timeout(config.timeout);

        if config.tls == TlsPolicy::Permissive {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

        let base_url = format!("https://{}:{}", target.host, target.port);

        let response = client
            .post(format!("{}/json/login_session", base_url))
            .json(&json!({
                "method": "login",
                "user_login": target.user,
                "password": target.password(),
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::authentication(format!(
                    "controller at {} rejected login for user {}",
                    target.host, target.user
                )));
            }
            status if !status.is_success() => {
                return Err(Error::communication(format!(
                    "login request failed: {}",
                    status
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::communication(format!("invalid login response: {}", e)))?;

        let session_key = body
            .get("session_key")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::authentication("login response carried no session key"))?
            .to_string();

        Ok(Self {
            client,
            base_url,
            session_key,
        })
    }

    /// Fetch one JSON document from the session
    async fn fetch(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "fetching controller document");

        let response = self
            .client
            .get(&url)
            .header("Cookie", format!("sessionKey={}", self.session_key))
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(Error::communication(format!(
                "request for {} failed: {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::communication(format!("invalid response for {}: {}", path, e)))
    }

    /// Fetch a document and pull one string field out of it
    async fn fetch_str(&self, path: &str, field: &str) -> Result<String> {
        let doc = self.fetch(path).await?;
        doc.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::communication(format!("{} missing from {}", field, path)))
    }
}

#[async_trait]
impl Controller for HttpController {
    async fn get_product_name(&self) -> Result<String> {
        self.fetch_str("json/overview", "product_name").await
    }

    async fn get_server_name(&self) -> Result<String> {
        self.fetch_str("json/overview", "server_name").await
    }

    async fn get_host_data(&self) -> Result<Value> {
        self.fetch("json/host_data").await
    }

    async fn get_embedded_health(&self) -> Result<Value> {
        self.fetch("json/embedded_health").await
    }

    async fn get_host_power_status(&self) -> Result<String> {
        self.fetch_str("json/host_power", "host_power").await
    }

    async fn get_fw_version(&self) -> Result<Value> {
        self.fetch("json/fw_version").await
    }

    async fn get_oa_info(&self) -> Result<Value> {
        self.fetch("json/oa_info").await
    }
}

/// Map a reqwest transport failure onto the request-failure taxonomy
fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::communication(format!("controller request timed out: {}", err))
    } else if err.is_connect() {
        Error::address_resolution(err.to_string())
    } else {
        Error::communication(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.tls, TlsPolicy::Permissive);
    }

    #[tokio::test]
    async fn test_open_session_unresolvable_host() {
        let mut params = std::collections::HashMap::new();
        params.insert("ilo_host".to_string(), "ilo.invalid".to_string());
        params.insert("ilo_user".to_string(), "admin".to_string());
        params.insert("ilo_password".to_string(), "secret".to_string());
        let target =
            IloTarget::resolve(&params, &ilo_core::TargetFallback::default()).unwrap();

        let config = SessionConfig {
            timeout: Duration::from_secs(2),
            tls: TlsPolicy::Permissive,
        };

        let err = HttpController::open_session(&target, &config)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::AddressResolution(_) | Error::Communication(_)
            ),
            "unexpected error: {err:?}"
        );
    }
}
