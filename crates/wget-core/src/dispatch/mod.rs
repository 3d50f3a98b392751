//! Weighted multi-base-URL dispatch
//!
//! A [`Dispatcher`] holds a fixed set of interchangeable backends. Each call
//! with a relative URL starts at a weighted-random backend and moves on to
//! the next one only when the exchange fails at the transport level.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod selector;

pub use backend::{rotation, BackendEntry, BackendSet, DEFAULT_WEIGHT};
pub use config::{BackendConfig, DispatcherConfig};
pub use dispatcher::Dispatcher;
pub use selector::WeightedSelector;
