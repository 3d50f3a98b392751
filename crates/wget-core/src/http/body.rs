//! Request body materialization
//!
//! Turns caller parameters into a re-seekable body stream (or a query string
//! for bodyless GET/HEAD requests) together with the method and headers the
//! transport should use.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use crate::http::transport::read_stream;
use crate::types::{BodyMode, Params};
use crate::{Error, Result};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Anything that can be read from and rewound
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// A request body that can be rewound before every attempt
pub struct BodyStream {
    inner: Box<dyn ReadSeek>,
}

impl BodyStream {
    /// Wrap a caller-provided seekable reader
    pub fn new<R>(reader: R) -> Self
    where
        R: Read + Seek + Send + 'static,
    {
        Self {
            inner: Box::new(reader),
        }
    }

    /// In-memory body
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// Seek back to the first byte
    pub fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Read everything from the current position
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for BodyStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// Method, URL, headers and body ready for the transport
#[derive(Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<BodyStream>,
}

/// Materialize `params` for a request to `url`
///
/// `url` may be absolute or a path relative to a dispatcher backend; a query
/// string is appended to it for bodyless GET/HEAD requests.
pub fn prepare(
    url: &str,
    method: &str,
    params: Params,
    headers: &HashMap<String, String>,
    mode: BodyMode,
) -> Result<PreparedRequest> {
    let method = parse_method(method, mode)?;
    let mut url = url.to_string();
    let mut header_map = HeaderMap::new();

    let body = match mode {
        BodyMode::Json => Some(json_stream(params)?),
        BodyMode::Form | BodyMode::FormWithGetBody => form_stream(params)?,
    };

    let body = match body {
        None => None,
        Some(mut stream) => {
            let bodyless = method == Method::GET || method == Method::HEAD;
            if !bodyless && !can_carry_params(&method) {
                return Err(Error::Unsupported {
                    message: format!("method {} not supported", method),
                    feature: Some(method.to_string()),
                });
            }

            if bodyless && mode == BodyMode::Form {
                let query = read_stream(&mut stream)?;
                append_query(&mut url, &String::from_utf8_lossy(&query));
                None
            } else {
                header_map.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                Some(stream)
            }
        }
    };

    apply_headers(&mut header_map, headers)?;
    if mode == BodyMode::Json {
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    Ok(PreparedRequest {
        method,
        url,
        headers: header_map,
        body,
    })
}

/// Encode params for form mode; `None` when there is nothing to send
pub fn form_stream(params: Params) -> Result<Option<BodyStream>> {
    let stream = match params {
        Params::Empty => return Ok(None),
        Params::Stream(stream) => stream,
        Params::Bytes(bytes) => BodyStream::from_bytes(bytes),
        Params::Text(text) => BodyStream::from_bytes(text),
        Params::Scalar(scalar) => BodyStream::from_bytes(scalar.to_string()),
        Params::Map(map) => {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &map {
                serializer.append_pair(key, &form_value(key, value)?);
            }
            BodyStream::from_bytes(serializer.finish())
        }
    };
    Ok(Some(stream))
}

/// Encode params for JSON mode
pub fn json_stream(params: Params) -> Result<BodyStream> {
    let encoded = match params {
        Params::Empty => return Err(Error::encoding("no params to build json")),
        Params::Stream(stream) => return Ok(stream),
        Params::Bytes(bytes) => return Ok(BodyStream::from_bytes(bytes)),
        Params::Text(text) => serde_json::to_vec(&text),
        Params::Map(map) => serde_json::to_vec(&map),
        Params::Scalar(scalar) => serde_json::to_vec(&scalar.to_json()),
    };

    encoded
        .map(BodyStream::from_bytes)
        .map_err(|e| Error::Encoding {
            message: format!("failed to encode json params: {}", e),
            source: Some(e.into()),
        })
}

/// Convert caller headers, later entries overriding earlier ones
pub fn apply_headers(target: &mut HeaderMap, headers: &HashMap<String, String>) -> Result<()> {
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| Error::Encoding {
            message: format!("invalid header name {:?}", key),
            source: Some(e.into()),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::Encoding {
            message: format!("invalid value for header {}", key),
            source: Some(e.into()),
        })?;
        target.insert(name, value);
    }
    Ok(())
}

fn parse_method(method: &str, mode: BodyMode) -> Result<Method> {
    if mode == BodyMode::FormWithGetBody {
        return Ok(Method::GET);
    }
    if method.is_empty() {
        return Ok(match mode {
            BodyMode::Json => Method::POST,
            _ => Method::GET,
        });
    }

    Method::from_bytes(method.to_uppercase().as_bytes()).map_err(|_| Error::Unsupported {
        message: format!("invalid HTTP method: {}", method),
        feature: Some(method.to_string()),
    })
}

fn can_carry_params(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

fn form_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Error::encoding(format!(
            "unknown type to build http params for key {:?}",
            key
        ))),
    }
}

fn append_query(url: &mut String, query: &str) {
    if query.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(query);
}
