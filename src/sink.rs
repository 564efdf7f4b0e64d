//! Sink Layer
//!
//! Delivery of converted metrics:
//!
//! - [`MetricsDaemon`]: `send(name, value, kind, prefix)` contract of the daemon client
//! - [`StatsdClient`]: statsd over UDP or TCP
//! - [`EmissionSink`]: per-event emission with origin prefixing and debug tracing

mod emission;
mod statsd;

pub use emission::{EmissionSink, EmitMode, EmitSummary};
pub use statsd::{MetricsDaemon, SinkError, StatsdClient};
