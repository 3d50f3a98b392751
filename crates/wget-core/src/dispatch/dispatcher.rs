//! Multi-base-URL dispatcher
//!
//! Picks a starting backend by weight, then walks the whole backend set once
//! (wrapping around) until an attempt completes without a transport error.
//! The request body is materialized once and rewound before every attempt.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::dispatch::backend::{BackendEntry, BackendSet};
use crate::dispatch::config::DispatcherConfig;
use crate::dispatch::selector::WeightedSelector;
use crate::http::body::{self, PreparedRequest};
use crate::http::client::HttpClient;
use crate::http::is_http_url;
use crate::http::response::Response;
use crate::types::{BodyMode, CallOptions, Params};
use crate::{Error, Result};

/// Dispatches relative requests across interchangeable backends
#[derive(Debug)]
pub struct Dispatcher {
    backends: BackendSet,
    selector: WeightedSelector,
    client: HttpClient,
}

impl Dispatcher {
    /// Dispatcher with a default reqwest client
    pub fn new(entries: Vec<BackendEntry>) -> Result<Self> {
        Self::with_client(entries, HttpClient::with_default_config()?)
    }

    /// Dispatcher issuing requests through `client`
    pub fn with_client(entries: Vec<BackendEntry>, client: HttpClient) -> Result<Self> {
        Self::with_rng(entries, client, Box::new(StdRng::from_entropy()))
    }

    /// Dispatcher with an injected random generator
    pub fn with_rng(
        entries: Vec<BackendEntry>,
        client: HttpClient,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self> {
        let backends = BackendSet::new(entries)?;
        let selector = WeightedSelector::new(&backends.weights(), rng)?;

        debug!(
            "dispatcher over {} backends with weights {:?}",
            backends.len(),
            backends.weights()
        );

        Ok(Self {
            backends,
            selector,
            client,
        })
    }

    /// Build backends and client from a configuration value
    pub fn from_config(config: &DispatcherConfig) -> Result<Self> {
        let client = HttpClient::new(config.client_config())?;
        Self::with_client(config.entries(), client)
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Form-encoded call; GET/HEAD params go to the query string
    pub async fn http_call(
        &self,
        uri: &str,
        method: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.dispatch(uri, method, params.into(), headers, BodyMode::Form, options)
            .await
    }

    /// JSON-encoded call
    pub async fn json_call(
        &self,
        uri: &str,
        method: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.dispatch(uri, method, params.into(), headers, BodyMode::Json, options)
            .await
    }

    /// GET whose params travel in a form-encoded body
    pub async fn get_with_body(
        &self,
        uri: &str,
        params: impl Into<Params>,
        headers: &HashMap<String, String>,
        options: &CallOptions,
    ) -> Result<Response> {
        self.dispatch(uri, "GET", params.into(), headers, BodyMode::FormWithGetBody, options)
            .await
    }

    pub(crate) async fn dispatch(
        &self,
        uri: &str,
        method: &str,
        params: Params,
        headers: &HashMap<String, String>,
        mode: BodyMode,
        options: &CallOptions,
    ) -> Result<Response> {
        if is_http_url(uri) {
            return self
                .client
                .execute_direct(uri, method, params, headers, mode, options)
                .await;
        }

        let prepared = body::prepare(uri, method, params, headers, mode)?;
        let start = self.selector.pick();
        debug!("{} {} starting at backend #{}", prepared.method, prepared.url, start);

        self.run_from(start, prepared, options).await
    }

    /// Try every backend once, beginning at `start`
    ///
    /// Only transport errors move on to the next backend; the last one is
    /// returned when every backend fails.
    pub(crate) async fn run_from(
        &self,
        start: usize,
        prepared: PreparedRequest,
        options: &CallOptions,
    ) -> Result<Response> {
        let PreparedRequest {
            method,
            url: path,
            headers,
            mut body,
        } = prepared;

        let mut last_error = None;
        for index in self.backends.rotation(start) {
            let backend = &self.backends[index];
            let url = format!("{}{}", backend.base_url(), path);

            if let Some(stream) = body.as_mut() {
                stream.rewind()?;
            }
            backend.touch();

            match self
                .client
                .send(&method, &url, &headers, body.as_mut(), options)
                .await
            {
                Ok(response) => {
                    debug!("backend #{} answered {} for {}", index, response.status(), url);
                    return Ok(response);
                }
                Err(error) => {
                    warn!("backend #{} failed: {}", index, error);
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(error) => {
                warn!(
                    "all {} backends failed for {} {}",
                    self.backends.len(),
                    method,
                    path
                );
                Err(error.into())
            }
            None => Err(Error::config("no backend items")),
        }
    }
}
