//! Converter Layer
//!
//! Turns firehose envelopes into statsd metrics. Each recognized event kind
//! has one stateless converter; the [`Dispatcher`] routes envelopes to them.
//!
//! # Architecture
//!
//! - [`Converter`]: Core trait, one implementation per event kind
//! - [`ConvertError`]: Rejection of malformed or incomplete events
//! - [`Dispatcher`]: Closed kind-to-converter table
//!
//! # Example
//!
//! ```rust
//! use nozzle::converter::Dispatcher;
//! use nozzle::event::{Envelope, ValueMetric};
//!
//! let envelope = Envelope::from(ValueMetric::new("memory.used", 512.0, "MiB"));
//! let metrics = Dispatcher::new().dispatch(&envelope).unwrap();
//! assert_eq!(metrics[0].name(), "memory.used");
//! ```

mod container;
mod counter;
mod dispatcher;
mod heartbeat;
mod http;
mod traits;
mod value;

pub use container::ContainerMetricConverter;
pub use counter::CounterConverter;
pub use dispatcher::Dispatcher;
pub use heartbeat::HeartbeatConverter;
pub use http::HttpStartStopConverter;
pub use traits::{ConversionResult, ConvertError, Converter};
pub use value::ValueMetricConverter;
