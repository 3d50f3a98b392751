//! File-like handles whose request runs on first use
//!
//! A [`LazyRequest`] records what to send but issues nothing until one of
//! its accessors is awaited. The request then runs exactly once, even when
//! several tasks touch the handle at the same time, and every accessor sees
//! the same outcome.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::http::client::HttpClient;
use crate::http::is_http_url;
use crate::http::response::Response;
use crate::types::{BodyMode, CallOptions, DebugWriter, Params};
use crate::{Error, Result};

/// What to send once the handle is first used
#[derive(Default)]
pub struct LazyArgs {
    pub params: Params,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
    /// Encode params as JSON instead of a form
    pub json_call: bool,
    pub debug_writer: Option<DebugWriter>,
    pub dispatcher: Option<Arc<Dispatcher>>,
}

enum LazyState {
    Pending(LazyArgs),
    /// The task running the request was dropped before it finished
    Abandoned,
    Completed(std::result::Result<Response, Arc<Error>>),
}

/// Metadata of a completed lazy request
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Last segment of the URL path
    pub name: String,
    pub size: Option<u64>,
    pub mod_time: Option<DateTime<Utc>>,
    pub is_dir: bool,
    pub status: StatusCode,
}

/// A request that behaves like an open file
pub struct LazyRequest {
    client: HttpClient,
    url: String,
    method: String,
    debug_writer: Option<DebugWriter>,
    state: Mutex<LazyState>,
}

impl LazyRequest {
    pub fn new(client: &HttpClient, url: &str, method: &str, args: LazyArgs) -> Self {
        Self {
            client: client.clone(),
            url: url.to_string(),
            method: method.to_string(),
            debug_writer: args.debug_writer.clone(),
            state: Mutex::new(LazyState::Pending(args)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Status, size and modification time of the response
    pub async fn stat(&self) -> Result<FileInfo> {
        let mut state = self.run().await;
        let response = completed(&mut state)?;

        Ok(FileInfo {
            name: base_name(&self.url),
            size: response.content_length(),
            mod_time: response.last_modified().ok(),
            is_dir: false,
            status: response.status(),
        })
    }

    pub async fn status(&self) -> Result<StatusCode> {
        let mut state = self.run().await;
        Ok(completed(&mut state)?.status())
    }

    /// Next piece of the body, `None` at the end
    pub async fn read_chunk(&self) -> Result<Option<Bytes>> {
        let mut state = self.run().await;
        completed(&mut state)?.chunk().await
    }

    /// Everything left of the body
    pub async fn read_to_end(&self) -> Result<Bytes> {
        let mut state = self.run().await;
        let response = completed(&mut state)?;

        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buf))
    }

    /// Release the body; later reads return nothing
    pub async fn close(&self) -> Result<()> {
        let mut state = self.run().await;
        completed(&mut state)?.discard_body();
        Ok(())
    }

    /// Take the underlying response, running the request if needed
    pub async fn into_response(self) -> Result<Response> {
        drop(self.run().await);
        match self.state.into_inner() {
            LazyState::Completed(Ok(response)) => Ok(response),
            LazyState::Completed(Err(error)) => Err(Error::Shared(error)),
            _ => Err(abandoned()),
        }
    }

    /// Decode the body as JSON, teeing it to the handle's debug writer
    pub async fn json<T: DeserializeOwned>(self) -> Result<(StatusCode, T)> {
        let debug_writer = self.debug_writer.clone();
        let response = self.into_response().await?;
        let status = response.status();
        let value = response.json(debug_writer.as_ref()).await?;
        Ok((status, value))
    }

    async fn run(&self) -> MutexGuard<'_, LazyState> {
        let mut state = self.state.lock().await;

        if matches!(*state, LazyState::Pending(_)) {
            if let LazyState::Pending(args) = mem::replace(&mut *state, LazyState::Abandoned) {
                debug!("running lazy {} {}", self.method, self.url);
                let outcome = self.execute(args).await.map_err(Arc::new);
                *state = LazyState::Completed(outcome);
            }
        }
        state
    }

    async fn execute(&self, args: LazyArgs) -> Result<Response> {
        let mode = if args.json_call {
            BodyMode::Json
        } else {
            BodyMode::Form
        };
        let options = CallOptions {
            timeout: args.timeout,
            skip_body_read: true,
            debug_writer: None,
            dispatcher: args.dispatcher,
        };

        self.client
            .call(&self.url, &self.method, args.params, &args.headers, mode, &options)
            .await
    }
}

fn completed(state: &mut LazyState) -> Result<&mut Response> {
    match state {
        LazyState::Completed(Ok(response)) => Ok(response),
        LazyState::Completed(Err(error)) => Err(Error::Shared(error.clone())),
        _ => Err(abandoned()),
    }
}

fn abandoned() -> Error {
    Error::Response {
        message: "lazy request was abandoned before completing".to_string(),
        source: None,
    }
}

/// Last path segment of `url`, `"/"` for a root path, empty when there is no path
fn base_name(url: &str) -> String {
    let path = if is_http_url(url) {
        match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => return String::new(),
        }
    } else {
        url.split(['?', '#']).next().unwrap_or_default().to_string()
    };

    if path.is_empty() {
        return String::new();
    }
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "/".to_string(),
    }
}

pub fn request(client: &HttpClient, url: &str, method: &str, args: LazyArgs) -> LazyRequest {
    LazyRequest::new(client, url, method, args)
}

pub fn get(client: &HttpClient, url: &str, args: LazyArgs) -> LazyRequest {
    request(client, url, "GET", args)
}

pub fn post(client: &HttpClient, url: &str, args: LazyArgs) -> LazyRequest {
    request(client, url, "POST", args)
}

pub fn put(client: &HttpClient, url: &str, args: LazyArgs) -> LazyRequest {
    request(client, url, "PUT", args)
}

pub fn delete(client: &HttpClient, url: &str, args: LazyArgs) -> LazyRequest {
    request(client, url, "DELETE", args)
}

pub fn head(client: &HttpClient, url: &str, args: LazyArgs) -> LazyRequest {
    request(client, url, "HEAD", args)
}

/// Run a request and hand back its status and unread response
pub async fn fs_call(
    client: &HttpClient,
    url: &str,
    method: &str,
    args: LazyArgs,
) -> Result<(StatusCode, Response)> {
    let response = request(client, url, method, args).into_response().await?;
    Ok((response.status(), response))
}

/// Run a request and decode its body as JSON
pub async fn fs_call_and_parse_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    method: &str,
    args: LazyArgs,
) -> Result<(StatusCode, T)> {
    request(client, url, method, args).json().await
}
