//! Firehose events.
//!
//! - [`Envelope`]: protobuf record delivered by the firehose
//! - [`EventKind`]: closed classification used by the dispatcher
//! - [`Origin`]: job/index identity used for metric prefixing

mod envelope;
mod kind;

pub use envelope::{
    ContainerMetric, CounterEvent, Envelope, EventType, Heartbeat, HttpStartStop, Method,
    PeerType, ValueMetric,
};
pub use kind::{EventKind, Origin};
