//! HTTP client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// A host pool was built without any hosts.
    #[error("Host pool requires at least one host")]
    EmptyHostPool,

    /// A pool host is not a valid absolute URL.
    #[error("Invalid pool host {host:?}: {reason}")]
    InvalidHost {
        /// The offending host entry.
        host: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Request building error.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// TLS configuration error.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Error raised by a custom client implementation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpClientError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Check if this error was raised while constructing a client or decorator.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyHostPool
                | Self::InvalidHost { .. }
                | Self::InvalidHeader(_)
                | Self::Tls(_)
        )
    }

    /// Get the HTTP status code carried by the transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<http::Error> for HttpClientError {
    fn from(err: http::Error) -> Self {
        Self::RequestBuild(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for HttpClientError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for HttpClientError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(HttpClientError::EmptyHostPool.is_configuration());
        assert!(
            HttpClientError::InvalidHost {
                host: "foobar".to_string(),
                reason: "relative URL without a base".to_string(),
            }
            .is_configuration()
        );
        assert!(!HttpClientError::Transport("boom".to_string()).is_configuration());
    }

    #[test]
    fn test_timeout_detection() {
        assert!(HttpClientError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!HttpClientError::Connection("refused".to_string()).is_timeout());
        assert!(HttpClientError::Connection("refused".to_string()).is_connection());
    }

    #[test]
    fn test_invalid_host_message() {
        let err = HttpClientError::InvalidHost {
            host: "foo.bar".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid pool host \"foo.bar\": relative URL without a base"
        );
    }
}
