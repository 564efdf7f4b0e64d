//! Feed Layer
//!
//! Upstream event delivery, decoupled from processing:
//!
//! - [`Firehose`]: Upstream subscription contract
//! - [`DopplerFirehose`]: Websocket implementation against Doppler
//! - [`StreamPump`]: Runs a subscription on its own task and exposes
//!   [`FeedChannels`] (bounded events, unbounded transport errors)

mod doppler;
mod pump;

pub use doppler::DopplerFirehose;
pub use pump::{FeedChannels, Firehose, StreamPump, TransportError};
