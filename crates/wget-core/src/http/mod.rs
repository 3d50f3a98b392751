//! HTTP plumbing for single requests
//!
//! This module provides:
//! - Body materialization from request parameters
//! - A transport seam with a reqwest implementation
//! - TLS trust modes and timeout configuration
//! - Response accessors (status, headers, last-modified)

pub mod body;
pub mod client;
pub mod error;
pub mod response;
pub mod timeout;
pub mod tls;
pub mod transport;

pub use body::{BodyStream, PreparedRequest};
pub use client::{HttpClient, HttpClientConfig};
pub use error::{TransportError, TransportErrorKind};
pub use response::Response;
pub use timeout::TimeoutConfig;
pub use tls::TlsConfig;
pub use transport::{ReqwestTransport, Transport, TransportRequest};

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};

/// Whether `url` is an absolute HTTP or HTTPS URL
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
