//! Error types for the wget-core library
//!
//! This module defines the error handling system for wget-core, using thiserror
//! for the error enum and anyhow for flexible error sources.

use std::sync::Arc;
use thiserror::Error;

use crate::http::error::TransportError;

/// Main error type for wget-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid backend set, certificate material or configuration file
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Request parameters that cannot be turned into a request
    #[error("Encoding error: {message}")]
    Encoding {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Unsupported method or operation
    #[error("Unsupported operation: {message}")]
    Unsupported {
        message: String,
        feature: Option<String>,
    },

    /// The HTTP exchange itself failed (connection, timeout, TLS, body read)
    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: TransportError,
    },

    /// A completed response lacks something the caller asked for
    #[error("Response error: {message}")]
    Response {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON decoding errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A memoized failure shared between accessors of one lazy request
    #[error(transparent)]
    Shared(Arc<Error>),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error without a source
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an encoding error without a source
    pub fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error came from the transport and may be retried elsewhere
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Shared(inner) => inner.is_transport(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
