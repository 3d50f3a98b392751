//! Core data types for wget-core
//!
//! Request parameters, per-call options and body materialization modes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::http::body::BodyStream;
use crate::{Error, Result};

/// Numeric or boolean parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// JSON representation of the scalar
    pub fn to_json(self) -> Value {
        match self {
            Scalar::Int(v) => Value::from(v),
            Scalar::UInt(v) => Value::from(v),
            Scalar::Float(v) => Value::from(v),
            Scalar::Bool(v) => Value::Bool(v),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Request parameters in one of the recognized shapes
///
/// `Map` values keep their JSON type so that JSON mode can encode them
/// faithfully; form mode flattens them to strings.
#[derive(Debug, Default)]
pub enum Params {
    /// No parameters
    #[default]
    Empty,
    /// Raw bytes sent verbatim in every mode
    ///
    /// JSON mode does not encode them (no base64, no quoting); the caller
    /// supplies an already serialized document.
    Bytes(Bytes),
    /// Text sent verbatim (form mode) or as a JSON string (JSON mode)
    Text(String),
    /// String-keyed mapping
    Map(BTreeMap<String, Value>),
    /// Single numeric or boolean value
    Scalar(Scalar),
    /// Caller-provided seekable stream, passed through untouched
    Stream(BodyStream),
}

impl Params {
    /// Build a map from string pairs
    pub fn form<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Params::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    /// Whether there is anything to send
    pub fn is_empty(&self) -> bool {
        matches!(self, Params::Empty)
    }
}

impl From<&str> for Params {
    fn from(value: &str) -> Self {
        Params::Text(value.to_string())
    }
}

impl From<String> for Params {
    fn from(value: String) -> Self {
        Params::Text(value)
    }
}

impl From<Vec<u8>> for Params {
    fn from(value: Vec<u8>) -> Self {
        Params::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Params {
    fn from(value: Bytes) -> Self {
        Params::Bytes(value)
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(value: HashMap<String, String>) -> Self {
        Params::form(value)
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Params::Map(value)
    }
}

impl From<i64> for Params {
    fn from(value: i64) -> Self {
        Params::Scalar(Scalar::Int(value))
    }
}

impl From<u64> for Params {
    fn from(value: u64) -> Self {
        Params::Scalar(Scalar::UInt(value))
    }
}

impl From<f64> for Params {
    fn from(value: f64) -> Self {
        Params::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for Params {
    fn from(value: bool) -> Self {
        Params::Scalar(Scalar::Bool(value))
    }
}

impl From<BodyStream> for Params {
    fn from(value: BodyStream) -> Self {
        Params::Stream(value)
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Params::Empty),
            Value::Bool(b) => Ok(Params::Scalar(Scalar::Bool(b))),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Params::Scalar(Scalar::Int(v)))
                } else if let Some(v) = n.as_u64() {
                    Ok(Params::Scalar(Scalar::UInt(v)))
                } else {
                    n.as_f64()
                        .map(|v| Params::Scalar(Scalar::Float(v)))
                        .ok_or_else(|| Error::encoding(format!("unrepresentable number {}", n)))
                }
            }
            Value::String(s) => Ok(Params::Text(s)),
            Value::Object(map) => Ok(Params::Map(map.into_iter().collect())),
            Value::Array(_) => Err(Error::encoding(
                "unknown type to build http params: top-level array",
            )),
        }
    }
}

/// How parameters are turned into a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Query string for GET/HEAD, form body otherwise
    Form,
    /// Form body for every method, including GET
    FormWithGetBody,
    /// JSON body
    Json,
}

/// Shared sink for debugging response bodies
pub type DebugWriter = Arc<Mutex<dyn Write + Send>>;

/// Per-call options
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Per-attempt timeout; the client default applies when unset
    pub timeout: Option<Duration>,
    /// Leave the response body unread for the caller to stream
    pub skip_body_read: bool,
    /// Receives a copy of every response body the library reads
    pub debug_writer: Option<DebugWriter>,
    /// Dispatcher used to resolve relative URLs
    pub dispatcher: Option<Arc<Dispatcher>>,
}

impl CallOptions {
    /// Options with a per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Leave the response body unread
    pub fn without_body_read(mut self) -> Self {
        self.skip_body_read = true;
        self
    }

    /// Tee response bodies into `writer`
    pub fn with_debug_writer(mut self, writer: DebugWriter) -> Self {
        self.debug_writer = Some(writer);
        self
    }

    /// Route relative URLs through `dispatcher`
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("timeout", &self.timeout)
            .field("skip_body_read", &self.skip_body_read)
            .field("debug_writer", &self.debug_writer.is_some())
            .field("dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}
