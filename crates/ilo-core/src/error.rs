//! Error handling for the iLO exporter
//!
//! Provides a unified error type and result type for use across all
//! exporter components.

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the iLO exporter
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required credential was supplied neither as a query parameter
    /// nor as an environment fallback
    #[error("missing parameter {0}")]
    MissingCredential(String),

    /// The port parameter did not parse as a positive integer
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// The controller rejected the supplied credentials
    #[error("controller login failed: {0}")]
    Authentication(String),

    /// The controller host could not be resolved or reached
    #[error("invalid address or port: {0}")]
    AddressResolution(String),

    /// Transport-level failure talking to the controller
    #[error("controller communication error: {0}")]
    Communication(String),

    /// Measurement registry invariant violation (declaration or label arity)
    #[error("registry error: {0}")]
    Registry(String),

    /// Exposition encoding failure
    #[error("encode error: {0}")]
    Encode(String),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential(name.into())
    }

    /// Create an invalid port error
    pub fn invalid_port(msg: impl Into<String>) -> Self {
        Self::InvalidPort(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an address resolution error
    pub fn address_resolution(msg: impl Into<String>) -> Self {
        Self::AddressResolution(msg.into())
    }

    /// Create a communication error
    pub fn communication(msg: impl Into<String>) -> Self {
        Self::Communication(msg.into())
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Check if this error was caused by the caller's target input
    /// rather than by the controller or the exporter itself
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::MissingCredential(_) | Error::InvalidPort(_))
    }

    /// Get the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::MissingCredential(_) => "missing_credential",
            Error::InvalidPort(_) => "invalid_port",
            Error::Authentication(_) => "authentication",
            Error::AddressResolution(_) => "address_resolution",
            Error::Communication(_) => "communication",
            Error::Registry(_) => "registry",
            Error::Encode(_) => "encode",
            Error::InvalidConfiguration(_) => "configuration",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Other(_) => "other",
        }
    }

    /// Convert to an HTTP status code. Every failure that stops a scrape
    /// surfaces as 500 with an empty body; the distinction between bad
    /// caller input and controller trouble lives in the log line only.
    pub fn to_http_status(&self) -> u16 {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::missing_credential("ilo_host");
        assert!(matches!(err, Error::MissingCredential(_)));
        assert_eq!(err.to_string(), "missing parameter ilo_host");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::authentication("denied").category(), "authentication");
        assert_eq!(Error::invalid_port("x").category(), "invalid_port");
        assert_eq!(Error::communication("reset").category(), "communication");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::missing_credential("ilo_user").is_client_error());
        assert!(Error::invalid_port("abc").is_client_error());
        assert!(!Error::authentication("denied").is_client_error());
        assert!(!Error::registry("arity").is_client_error());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(Error::missing_credential("ilo_host").to_http_status(), 500);
        assert_eq!(Error::communication("reset").to_http_status(), 500);
    }
}
