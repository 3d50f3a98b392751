//! TLS/HTTPS configuration for HTTP clients
//!
//! Three trust modes are supported: default certificate validation,
//! validation disabled, and mutual TLS with a client certificate/key pair
//! plus a trusted-root PEM bundle.

use std::path::{Path, PathBuf};

use reqwest::{Certificate, ClientBuilder, Identity};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// TLS/HTTPS configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Skip certificate validation entirely
    pub accept_invalid_certs: bool,
    /// Client certificate path (for mutual TLS)
    pub client_cert_path: Option<PathBuf>,
    /// Client private key path (for mutual TLS)
    pub client_key_path: Option<PathBuf>,
    /// PEM bundle of trusted roots; defaults to the client certificate file
    pub ca_bundle_path: Option<PathBuf>,
}

impl TlsConfig {
    /// Validate server certificates against the system roots
    pub fn secure() -> Self {
        Self::default()
    }

    /// Accept any server certificate
    pub fn insecure() -> Self {
        Self {
            accept_invalid_certs: true,
            ..Self::default()
        }
    }

    /// Mutual TLS with a client certificate and key
    pub fn mutual(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            client_cert_path: Some(cert_path.into()),
            client_key_path: Some(key_path.into()),
            ..Self::default()
        }
    }

    /// Trust the roots in `path` instead of the client certificate file
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle_path = Some(path.into());
        self
    }

    /// Check if this configuration presents a client certificate
    pub fn has_client_cert(&self) -> bool {
        self.client_cert_path.is_some()
    }

    /// Validate the TLS configuration
    pub fn validate(&self) -> Result<()> {
        match (&self.client_cert_path, &self.client_key_path) {
            (Some(_), None) | (None, Some(_)) => Err(Error::config(
                "incomplete client certificate configuration: both cert and key paths must be provided",
            )),
            _ => Ok(()),
        }
    }

    /// Apply the trust mode to a reqwest client builder
    ///
    /// Certificate material is loaded here, so failures surface while the
    /// client is built rather than at request time.
    pub fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder> {
        self.validate()?;

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let (Some(cert_path), Some(key_path)) = (&self.client_cert_path, &self.client_key_path) {
            let identity = load_identity(cert_path, key_path)?;
            let bundle = self.ca_bundle_path.as_deref().unwrap_or(cert_path);
            builder = builder.use_rustls_tls().identity(identity);
            for cert in load_trust_bundle(bundle)? {
                builder = builder.add_root_certificate(cert);
            }
        } else if let Some(bundle) = &self.ca_bundle_path {
            for cert in load_trust_bundle(bundle)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(builder)
    }
}

/// Load a client identity from a PEM certificate file and a PEM key file
pub fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity> {
    let mut pem = read_pem(cert_path)?;
    pem.push(b'\n');
    pem.extend(read_pem(key_path)?);

    Identity::from_pem(&pem).map_err(|e| Error::Configuration {
        message: format!(
            "failed to load client certificate {:?} with key {:?}",
            cert_path, key_path
        ),
        source: Some(e.into()),
    })
}

/// Load every certificate from a PEM bundle
pub fn load_trust_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = read_pem(path)?;
    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| Error::Configuration {
        message: format!("failed to parse PEM bundle {:?}", path),
        source: Some(e.into()),
    })?;

    if certs.is_empty() {
        return Err(Error::config(format!("no certificates found in {:?}", path)));
    }
    Ok(certs)
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    let content = std::fs::read(path).map_err(|e| Error::Configuration {
        message: format!("failed to read {:?}", path),
        source: Some(e.into()),
    })?;

    if !validate_pem_format(&content) {
        return Err(Error::config(format!("{:?} is not PEM encoded", path)));
    }
    Ok(content)
}

/// Helper function to validate PEM framing
pub fn validate_pem_format(pem_content: &[u8]) -> bool {
    let text = String::from_utf8_lossy(pem_content);
    text.contains("-----BEGIN") && text.contains("-----END")
}
