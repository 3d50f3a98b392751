//! Transport-level error classification
//!
//! Separates failures to complete an HTTP exchange from responses that merely
//! carry a non-2xx status. Only the former trigger backend rotation.

use std::fmt;

/// Classification of transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not connect (refused, DNS, TLS handshake)
    Connect,
    /// The per-attempt deadline elapsed
    Timeout,
    /// The request could not be built or sent
    Request,
    /// Reading the request or response body failed
    Body,
    /// Anything reqwest did not classify
    Other,
}

/// A failed HTTP exchange against a single URL
#[derive(Debug)]
pub struct TransportError {
    /// Failure classification
    pub kind: TransportErrorKind,
    /// URL the attempt was issued against
    pub url: String,
    /// Human-readable error message
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Create a transport error without an underlying source
    pub fn new(kind: TransportErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create from a reqwest error
    pub fn from_request_error(url: &str, error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else if error.is_request() || error.is_builder() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        Self {
            kind,
            url: url.to_string(),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Create from a failure reading the outgoing body stream
    pub fn from_body_error(url: &str, error: std::io::Error) -> Self {
        Self {
            kind: TransportErrorKind::Body,
            url: url.to_string(),
            message: format!("failed to read request body: {}", error),
            source: Some(Box::new(error)),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, url: {})", self.message, self.kind, self.url)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<TransportError> for crate::Error {
    fn from(source: TransportError) -> Self {
        crate::Error::Transport { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_kind_and_url() {
        let err = TransportError::new(
            TransportErrorKind::Timeout,
            "http://api.example/items",
            "operation timed out",
        );
        let text = err.to_string();
        assert!(text.contains("operation timed out"));
        assert!(text.contains("Timeout"));
        assert!(text.contains("http://api.example/items"));
    }

    #[test]
    fn test_body_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = TransportError::from_body_error("http://a/x", io);
        assert_eq!(err.kind, TransportErrorKind::Body);
        assert!(err.source().is_some());
    }
}
