//! Serializable dispatcher configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::backend::BackendEntry;
use crate::http::client::HttpClientConfig;
use crate::http::timeout::TimeoutConfig;
use crate::http::tls::TlsConfig;
use crate::{Error, Result};

/// One backend as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// 0 or absent means "use the default weight"
    #[serde(default)]
    pub weight: u32,
}

/// Backends plus the client settings used to reach them
///
/// ```json
/// {
///   "backends": [
///     { "base_url": "http://10.0.0.1:8080", "weight": 3 },
///     { "base_url": "http://10.0.0.2:8080", "weight": 1 }
///   ],
///   "timeout_secs": 10
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub backends: Vec<BackendConfig>,
    pub timeout_secs: Option<u64>,
    pub tls: TlsConfig,
    pub user_agent: Option<String>,
}

impl DispatcherConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration {
            message: format!("invalid dispatcher configuration: {}", e),
            source: Some(e.into()),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Configuration {
            message: format!("failed to read dispatcher configuration {}", path.display()),
            source: Some(e.into()),
        })?;
        Self::from_json_str(&content)
    }

    /// Backend entries in file order
    pub fn entries(&self) -> Vec<BackendEntry> {
        self.backends
            .iter()
            .map(|b| BackendEntry::weighted(b.base_url.clone(), b.weight))
            .collect()
    }

    /// Client settings; an absent or zero timeout keeps the default
    pub fn client_config(&self) -> HttpClientConfig {
        let defaults = TimeoutConfig::default();
        let timeout = match self.timeout_secs {
            Some(secs) if secs > 0 => defaults.with_request_timeout(Duration::from_secs(secs)),
            _ => defaults,
        };

        HttpClientConfig {
            timeout,
            tls: self.tls.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_weighted_backends() {
        let config = DispatcherConfig::from_json_str(
            r#"{
                "backends": [
                    {"base_url": "http://a.example", "weight": 3},
                    {"base_url": "http://b.example", "weight": 1}
                ],
                "timeout_secs": 10
            }"#,
        )
        .unwrap();

        let entries = config.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].weight(), 3);
        assert_eq!(
            config.client_config().timeout.request_timeout,
            Duration::from_secs(10)
        );
        assert!(!config.client_config().tls.accept_invalid_certs);
    }

    #[test]
    fn test_weight_optional() {
        let config =
            DispatcherConfig::from_json_str(r#"{"backends": [{"base_url": "http://a.example"}]}"#)
                .unwrap();
        assert_eq!(config.backends[0].weight, 0);
        assert_eq!(config.client_config().timeout, TimeoutConfig::default());
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let err = DispatcherConfig::from_json_str("{backends:").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"backends": [{{"base_url": "https://a.example"}}], "tls": {{"accept_invalid_certs": true}}}}"#
        )
        .unwrap();

        let config = DispatcherConfig::from_file(file.path()).unwrap();
        assert!(config.tls.accept_invalid_certs);
        assert_eq!(config.backends[0].base_url, "https://a.example");
    }

    #[test]
    fn test_missing_file() {
        let err = DispatcherConfig::from_file("/nonexistent/dispatcher.json").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
