//! Timeout configuration for HTTP requests
//!
//! The request timeout applies to each attempt independently; a rotation
//! over N backends may therefore take up to N times the configured value.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Default seconds to wait for a request to complete
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout: Duration,
    /// Request timeout - total time for one attempt
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Same timeout for connecting and for the whole attempt
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs), Duration::from_secs(secs))
    }

    /// Override the request timeout
    pub fn with_request_timeout(&self, timeout: Duration) -> Self {
        let mut config = self.clone();
        config.request_timeout = timeout;
        config
    }

    /// Timeout for one attempt, honoring a per-call override
    ///
    /// A zero override falls back to the configured value.
    pub fn resolve(&self, per_call: Option<Duration>) -> Duration {
        match per_call {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => self.request_timeout,
        }
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = TimeoutConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_override() {
        let config = TimeoutConfig::from_secs(10);
        assert_eq!(config.resolve(None), Duration::from_secs(10));
        assert_eq!(config.resolve(Some(Duration::from_secs(2))), Duration::from_secs(2));
        assert_eq!(config.resolve(Some(Duration::ZERO)), Duration::from_secs(10));
    }

    #[test]
    fn test_validation() {
        let config = TimeoutConfig::new(Duration::ZERO, Duration::from_secs(1));
        assert!(config.validate().is_err());

        let config = TimeoutConfig::default().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
