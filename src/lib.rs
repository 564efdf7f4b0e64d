//! Nozzle - Firehose to Statsd Forwarder
//!
//! Subscribes to a Cloud Foundry Doppler firehose, converts each telemetry
//! envelope into statsd metrics and forwards them to a metrics daemon over
//! UDP or TCP. Runs as the `nozzle` executable or embeds as a library.
//!
//! # Architecture
//!
//! - **Feed**: websocket subscription run by a [`StreamPump`] on its own task
//! - **Converter**: one converter per event kind behind a closed [`Dispatcher`]
//! - **Sink**: [`EmissionSink`] forwarding to [`StatsdClient`] or tracing to stdout
//! - **Nozzle**: the [`Nozzle`] main loop tying them together
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nozzle::{AppConfig, DopplerFirehose, Nozzle, UaaTokenFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("configs/nozzle.yaml")?;
//!     let mut nozzle = Nozzle::from_config(&config).await?;
//!     let auth = UaaTokenFetcher::new(&config.uaa.endpoint, config.uaa.credentials())?;
//!     let firehose = Arc::new(DopplerFirehose::new(&config.doppler.endpoint));
//!     nozzle.run(&auth, firehose).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod converter;
pub mod event;
pub mod feed;
pub mod metric;
pub mod nozzle;
pub mod sink;

pub use auth::{AuthError, TokenFetcher, UaaTokenFetcher};
pub use config::{AppConfig, ConfigError, StatsdProtocol};
pub use converter::{ConvertError, Converter, Dispatcher};
pub use event::{Envelope, EventKind, Origin};
pub use feed::{DopplerFirehose, FeedChannels, Firehose, StreamPump, TransportError};
pub use metric::{Metric, MetricKind, MetricValue};
pub use nozzle::{Nozzle, NozzleError, NozzleState, NozzleStats};
pub use sink::{EmissionSink, EmitMode, MetricsDaemon, SinkError, StatsdClient};
