//! HTTP client for single-URL calls
//!
//! Provides the form, JSON and GET-with-body entry points against absolute
//! URLs. Relative URLs are handed to the dispatcher attached to the call
//! options.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::body::{self, BodyStream};
use crate::http::error::TransportError;
use crate::http::response::{tee_body, Response};
use crate::http::timeout::TimeoutConfig;
use crate::http::tls::TlsConfig;
use crate::http::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::http::is_http_url;
use crate::types::{BodyMode, CallOptions, Params};
use crate::{Error, Result};

/// Configuration for the HTTP client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Connect and per-attempt timeouts
    pub timeout: TimeoutConfig,
    /// Trust mode
    pub tls: TlsConfig,
    /// User-Agent header sent with every request
    pub user_agent: Option<String>,
}

/// HTTP client issuing one request per call
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a reqwest-backed client
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        config.timeout.validate().map_err(Error::config)?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create with default configuration
    pub fn with_default_config() -> Result<Self> {
        Self::new(HttpClientConfig::default())
    }

    /// Use a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: HttpClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Form-encoded call; GET/HEAD params go to the query string
    pub async fn http_call(
        &self,
        url: &str,
        method: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.call(url, method, params.into(), headers, BodyMode::Form, options)
            .await
    }

    /// JSON-encoded call
    pub async fn json_call(
        &self,
        url: &str,
        method: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.call(url, method, params.into(), headers, BodyMode::Json, options)
            .await
    }

    /// GET whose params travel in a form-encoded body
    pub async fn get_with_body(
        &self,
        url: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.call(url, "GET", params.into(), headers, BodyMode::FormWithGetBody, options)
            .await
    }

    /// Modification time of an HTTP resource or a local file
    ///
    /// HTTP URLs are probed with a HEAD request and the `Last-Modified`
    /// header; anything else is treated as a filesystem path.
    pub async fn mod_time(&self, url_or_path: &str) -> Result<DateTime<Utc>> {
        if is_http_url(url_or_path) {
            let response = self
                .http_call(url_or_path, "HEAD", Params::Empty, &HashMap::new(), &CallOptions::default())
                .await?;
            return response.last_modified();
        }

        let metadata = tokio::fs::metadata(Path::new(url_or_path)).await?;
        Ok(DateTime::<Utc>::from(metadata.modified()?))
    }

    pub(crate) async fn call(
        &self,
        url: &str,
        method: &str,
        params: Params,
        headers: &HashMap<String, String>,
        mode: BodyMode,
        options: &CallOptions,
    ) -> Result<Response> {
        if is_http_url(url) {
            return self
                .execute_direct(url, method, params, headers, mode, options)
                .await;
        }

        match &options.dispatcher {
            Some(dispatcher) => {
                dispatcher
                    .dispatch(url, method, params, headers, mode, options)
                    .await
            }
            None => Err(Error::config(format!(
                "relative URL {} requires a dispatcher",
                url
            ))),
        }
    }

    /// Single request with no rotation
    pub(crate) async fn execute_direct(
        &self,
        url: &str,
        method: &str,
        params: Params,
        headers: &HashMap<String, String>,
        mode: BodyMode,
        options: &CallOptions,
    ) -> Result<Response> {
        let mut prepared = body::prepare(url, method, params, headers, mode)?;
        debug!("direct {} {}", prepared.method, prepared.url);

        self.send(
            &prepared.method,
            &prepared.url,
            &prepared.headers,
            prepared.body.as_mut(),
            options,
        )
        .await
        .map_err(Error::from)
    }

    /// Hand one attempt to the transport
    pub(crate) async fn send(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&mut BodyStream>,
        options: &CallOptions,
    ) -> std::result::Result<Response, TransportError> {
        let request = TransportRequest {
            method: method.clone(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
            timeout: self.config.timeout.resolve(options.timeout),
            read_body: !options.skip_body_read,
        };

        let response = self.transport.execute(request).await?;

        if let (Some(writer), Some(bytes)) = (&options.debug_writer, response.body()) {
            tee_body(writer, bytes);
        }
        Ok(response)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
