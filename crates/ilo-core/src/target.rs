//! Per-request target resolution
//!
//! Each incoming request names its own controller. The resolved identity
//! is an overlay of the request's query parameters over process-wide
//! fallback values (sourced from the environment at startup), with the
//! port defaulting to 443. The identity lives exactly as long as the
//! request and is never logged with its password.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Default controller port when neither the request nor the environment
/// provides one
pub const DEFAULT_PORT: u16 = 443;

/// Names of the query parameters / environment variables
pub const PARAM_HOST: &str = "ilo_host";
pub const PARAM_USER: &str = "ilo_user";
pub const PARAM_PASSWORD: &str = "ilo_password";
pub const PARAM_PORT: &str = "ilo_port";

/// Process-wide fallback values for target resolution.
///
/// Read once at startup and never mutated afterwards; shared read-only
/// across request workers.
#[derive(Debug, Clone, Default)]
pub struct TargetFallback {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<String>,
}

impl TargetFallback {
    /// Source fallback values from the process environment
    pub fn from_env() -> Self {
        Self {
            host: std::env::var(PARAM_HOST).ok(),
            user: std::env::var(PARAM_USER).ok(),
            password: std::env::var(PARAM_PASSWORD).ok(),
            port: std::env::var(PARAM_PORT).ok(),
        }
    }
}

/// Resolved identity of one controller target
#[derive(Clone, PartialEq, Eq)]
pub struct IloTarget {
    pub host: String,
    pub user: String,
    password: String,
    pub port: u16,
}

impl IloTarget {
    /// Resolve a target identity from request query parameters overlaid
    /// on the process-wide fallback.
    ///
    /// `host`, `user`, and `password` take the query value when present
    /// and non-empty, else the fallback, else fail with
    /// [`Error::MissingCredential`]. The port must parse as a positive
    /// integer when supplied.
    pub fn resolve(params: &HashMap<String, String>, fallback: &TargetFallback) -> Result<Self> {
        let host = overlay(params.get(PARAM_HOST), fallback.host.as_ref())
            .ok_or_else(|| Error::missing_credential(PARAM_HOST))?;
        let user = overlay(params.get(PARAM_USER), fallback.user.as_ref())
            .ok_or_else(|| Error::missing_credential(PARAM_USER))?;
        let password = overlay(params.get(PARAM_PASSWORD), fallback.password.as_ref())
            .ok_or_else(|| Error::missing_credential(PARAM_PASSWORD))?;

        let port = match overlay(params.get(PARAM_PORT), fallback.port.as_ref()) {
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| Error::invalid_port(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            user,
            password,
            port,
        })
    }

    /// The credential used to authenticate against the controller
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Password is deliberately absent from the Debug rendering.
impl std::fmt::Debug for IloTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IloTarget")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Query parameter when present and non-empty, else the fallback
fn overlay(param: Option<&String>, fallback: Option<&String>) -> Option<String> {
    param
        .filter(|v| !v.is_empty())
        .or(fallback)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_fallback() -> TargetFallback {
        TargetFallback {
            host: Some("10.0.0.1".to_string()),
            user: Some("admin".to_string()),
            password: Some("secret".to_string()),
            port: Some("8443".to_string()),
        }
    }

    #[test]
    fn test_fallback_only() {
        let target = IloTarget::resolve(&HashMap::new(), &full_fallback()).unwrap();
        assert_eq!(target.host, "10.0.0.1");
        assert_eq!(target.user, "admin");
        assert_eq!(target.password(), "secret");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_query_overrides_host_only() {
        let mut params = HashMap::new();
        params.insert(PARAM_HOST.to_string(), "10.0.0.2".to_string());

        let target = IloTarget::resolve(&params, &full_fallback()).unwrap();
        assert_eq!(target.host, "10.0.0.2");
        assert_eq!(target.user, "admin");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_empty_query_value_falls_back() {
        let mut params = HashMap::new();
        params.insert(PARAM_HOST.to_string(), String::new());

        let target = IloTarget::resolve(&params, &full_fallback()).unwrap();
        assert_eq!(target.host, "10.0.0.1");
    }

    #[test]
    fn test_missing_credential() {
        let fallback = TargetFallback {
            host: Some("10.0.0.1".to_string()),
            ..Default::default()
        };
        let err = IloTarget::resolve(&HashMap::new(), &fallback).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref name) if name == PARAM_USER));
    }

    #[test]
    fn test_port_defaults_to_443() {
        let fallback = TargetFallback {
            port: None,
            ..full_fallback()
        };
        let target = IloTarget::resolve(&HashMap::new(), &fallback).unwrap();
        assert_eq!(target.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_port() {
        let mut params = HashMap::new();
        params.insert(PARAM_PORT.to_string(), "not-a-port".to_string());

        let err = IloTarget::resolve(&params, &full_fallback()).unwrap_err();
        assert!(matches!(err, Error::InvalidPort(_)));

        let mut params = HashMap::new();
        params.insert(PARAM_PORT.to_string(), "0".to_string());
        let err = IloTarget::resolve(&params, &full_fallback()).unwrap_err();
        assert!(matches!(err, Error::InvalidPort(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let target = IloTarget::resolve(&HashMap::new(), &full_fallback()).unwrap();
        let rendered = format!("{:?}", target);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }
}
