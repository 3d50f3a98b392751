//! Transport seam and its reqwest implementation
//!
//! A transport issues exactly one request per call. Anything that prevents
//! the exchange from completing is reported as a [`TransportError`]; a
//! response with any status code is a success at this layer.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::http::body::BodyStream;
use crate::http::client::HttpClientConfig;
use crate::http::error::TransportError;
use crate::http::response::Response;
use crate::{Error, Result};

/// One attempt against one absolute URL
#[derive(Debug)]
pub struct TransportRequest<'a> {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Body positioned at its first byte
    pub body: Option<&'a mut BodyStream>,
    pub timeout: Duration,
    /// Read the whole response body before returning
    pub read_body: bool,
}

/// Executes single HTTP requests
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest<'_>) -> std::result::Result<Response, TransportError>;
}

/// Transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Build the underlying client, loading any TLS material
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder().connect_timeout(config.timeout.connect_timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder = config.tls.apply(builder)?;

        let client = builder.build().map_err(|e| Error::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e.into()),
        })?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest<'_>) -> std::result::Result<Response, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
            timeout,
            read_body,
        } = request;

        let mut builder = self
            .client
            .request(method.clone(), url.as_str())
            .headers(headers)
            .timeout(timeout);

        if let Some(stream) = body {
            let payload = read_stream(stream).map_err(|e| TransportError::from_body_error(&url, e))?;
            debug!("{} {} with {} byte body", method, url, payload.len());
            builder = builder.body(payload);
        } else {
            debug!("{} {}", method, url);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_request_error(&url, e))?;

        if !read_body {
            return Ok(Response::streaming(response));
        }

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_request_error(&url, e))?;

        Ok(Response::buffered(status, final_url, headers, body))
    }
}

/// Read a body stream that may be backed by blocking I/O
///
/// On a multi-threaded runtime the read moves off the async worker; a
/// current-thread runtime cannot do that and reads in place.
pub(crate) fn read_stream(stream: &mut BodyStream) -> io::Result<Vec<u8>> {
    let multi_thread = Handle::try_current()
        .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
        .unwrap_or(false);

    if multi_thread {
        tokio::task::block_in_place(|| stream.read_to_vec())
    } else {
        stream.read_to_vec()
    }
}
