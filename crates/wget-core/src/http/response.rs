//! Completed HTTP responses and their accessors

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LAST_MODIFIED};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::http::error::TransportError;
use crate::types::DebugWriter;
use crate::{Error, Result};

enum ResponseBody {
    Buffered(Bytes),
    Streaming(reqwest::Response),
    Consumed,
}

/// A response received from a backend, whatever its status code
pub struct Response {
    status: StatusCode,
    url: String,
    headers: HeaderMap,
    content_length: Option<u64>,
    body: ResponseBody,
}

impl Response {
    /// A response whose body has been read in full
    pub fn buffered(status: StatusCode, url: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            url: url.into(),
            headers,
            content_length: Some(body.len() as u64),
            body: ResponseBody::Buffered(body),
        }
    }

    /// A response whose body is left on the wire for the caller
    pub fn streaming(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            url: response.url().to_string(),
            headers: response.headers().clone(),
            content_length: response.content_length(),
            body: ResponseBody::Streaming(response),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status line such as `"404 Not Found"`
    pub fn status_text(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }

    /// URL the response was received from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of every header; values that are not valid UTF-8 are empty
    pub fn headers_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(self.headers.keys_len());
        for name in self.headers.keys() {
            let value = self
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            map.insert(name.as_str().to_string(), value.to_string());
        }
        map
    }

    /// First value of a single header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Length announced by the server, or of the buffered body
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Parse the `Last-Modified` header
    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        let value = self
            .headers
            .get(LAST_MODIFIED)
            .ok_or_else(|| Error::Response {
                message: "no response header Last-Modified".to_string(),
                source: None,
            })?;

        let text = value.to_str().map_err(|e| Error::Response {
            message: "Last-Modified is not valid text".to_string(),
            source: Some(e.into()),
        })?;

        DateTime::parse_from_rfc2822(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::Response {
                message: format!("unparseable Last-Modified {:?}", text),
                source: Some(e.into()),
            })
    }

    /// Buffered body, if the library read it
    pub fn body(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Buffered(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Whether the body is still waiting on the wire
    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    /// Next piece of the body; `None` once it is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        if let ResponseBody::Streaming(response) = &mut self.body {
            return response
                .chunk()
                .await
                .map_err(|e| TransportError::from_request_error(&self.url, e).into());
        }

        match std::mem::replace(&mut self.body, ResponseBody::Consumed) {
            ResponseBody::Buffered(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }

    /// The whole body, reading it from the wire if needed
    pub async fn bytes(self) -> Result<Bytes> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(response) => response
                .bytes()
                .await
                .map_err(|e| TransportError::from_request_error(&self.url, e).into()),
            ResponseBody::Consumed => Err(Error::Response {
                message: "response body already consumed".to_string(),
                source: None,
            }),
        }
    }

    /// Drop whatever is left of the body, releasing the connection
    pub fn discard_body(&mut self) {
        self.body = ResponseBody::Consumed;
    }

    /// Decode the body as JSON, copying it to `debug` first when given
    pub async fn json<T: DeserializeOwned>(self, debug: Option<&DebugWriter>) -> Result<T> {
        let body = self.bytes().await?;
        if let Some(writer) = debug {
            tee_body(writer, &body);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .field("streaming", &self.is_streaming())
            .finish()
    }
}

/// Write `body: <bytes>\n` to a debug sink
pub(crate) fn tee_body(writer: &DebugWriter, body: &[u8]) {
    let mut sink = match writer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Err(e) = write_body(&mut *sink, body) {
        tracing::warn!("failed to write response body to debug writer: {}", e);
    }
}

fn write_body(sink: &mut dyn Write, body: &[u8]) -> std::io::Result<()> {
    sink.write_all(b"body: ")?;
    sink.write_all(body)?;
    sink.write_all(b"\n")
}
