//! wget-core - HTTP client helpers with weighted multi-base-URL dispatch
//!
//! This crate wraps a reqwest transport with convenience entry points for
//! form, JSON and GET-with-body requests, and spreads relative requests over
//! a set of interchangeable backends with weighted random selection and
//! linear failover.
//!
//! # Main Components
//!
//! - **Dispatcher**: picks a backend by weight and rotates on transport errors
//! - **HttpClient**: single-URL calls, response accessors and `mod_time`
//! - **JSON helpers**: calls that decode the response into a typed value
//! - **Lazy requests**: file-like handles that send on first use
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use wget_core::{BackendEntry, CallOptions, Dispatcher, Params, Result};
//!
//! async fn example() -> Result<()> {
//!     let dispatcher = Dispatcher::new(vec![
//!         BackendEntry::weighted("http://10.0.0.1:8080", 3),
//!         BackendEntry::weighted("http://10.0.0.2:8080", 1),
//!     ])?;
//!
//!     let response = dispatcher
//!         .http_call(
//!             "/items",
//!             "GET",
//!             Params::form([("q", "x")]),
//!             &HashMap::new(),
//!             &CallOptions::default(),
//!         )
//!         .await?;
//!     println!("{}", response.status_text());
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod http;
pub mod json;
pub mod lazy;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use types::{BodyMode, CallOptions, DebugWriter, Params, Scalar};

pub use dispatch::{
    BackendConfig, BackendEntry, BackendSet, Dispatcher, DispatcherConfig, WeightedSelector,
    DEFAULT_WEIGHT,
};
pub use http::{
    BodyStream, HttpClient, HttpClientConfig, Method, Response, StatusCode, TimeoutConfig,
    TlsConfig, Transport, TransportError, TransportErrorKind,
};
pub use json::{http_call_json, json_call_json};
pub use lazy::{fs_call, fs_call_and_parse_json, FileInfo, LazyArgs, LazyRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
