//! HttpStartStop converter.

use crate::converter::traits::{ConversionResult, ConvertError, Converter, require};
use crate::event::{Envelope, EventKind, Method};
use crate::metric::Metric;

const KIND: EventKind = EventKind::HttpStartStop;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Emits a request counter and a response-time timing per request.
///
/// - `http.requests.<method>.<class>` counter of 1, where class is `2xx`, `5xx`, ...
/// - `http.response_time.<method>` timing in milliseconds
///
/// A stop timestamp earlier than the start timestamp rejects the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpStartStopConverter;

impl Converter for HttpStartStopConverter {
    fn kind(&self) -> EventKind {
        KIND
    }

    fn convert(&self, envelope: &Envelope) -> ConversionResult {
        let event = require(envelope.http_start_stop.as_ref(), KIND, "http_start_stop")?;
        let start = require(event.start_timestamp, KIND, "start_timestamp")?;
        let stop = require(event.stop_timestamp, KIND, "stop_timestamp")?;
        let method = require(event.method, KIND, "method")?;
        let status = require(event.status_code, KIND, "status_code")?;

        if stop < start {
            return Err(ConvertError::InvertedTimestamps { start, stop });
        }

        let class = status_class(status)?;
        let method = Method::try_from(method).map_or("other", |m| m.as_str());
        let millis = stop.saturating_sub(start) / NANOS_PER_MILLI;

        Ok(vec![
            Metric::counter(format!("http.requests.{method}.{class}"), 1),
            Metric::timing(format!("http.response_time.{method}"), millis as u64),
        ])
    }
}

fn status_class(status: i32) -> Result<String, ConvertError> {
    if !(100..=599).contains(&status) {
        return Err(ConvertError::InvalidField {
            kind: KIND,
            field: "status_code",
            reason: format!("{status} is not an HTTP status"),
        });
    }
    Ok(format!("{}xx", status / 100))
}
