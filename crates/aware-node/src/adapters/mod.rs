//! # Adapters
//!
//! Port decorators the node wraps around the engine.

pub mod metrics;

pub use metrics::{record_rejection, MeteredSink, MeteredTransport, MetricsBridge};
