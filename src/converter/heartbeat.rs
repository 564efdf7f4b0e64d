//! Heartbeat converter.

use crate::converter::traits::{ConversionResult, Converter, require};
use crate::event::{Envelope, EventKind};
use crate::metric::Metric;

const KIND: EventKind = EventKind::Heartbeat;

/// Emits sent/received/error count gauges for a component heartbeat.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatConverter;

impl Converter for HeartbeatConverter {
    fn kind(&self) -> EventKind {
        KIND
    }

    fn convert(&self, envelope: &Envelope) -> ConversionResult {
        let event = require(envelope.heartbeat.as_ref(), KIND, "heartbeat")?;
        let sent = require(event.sent_count, KIND, "sent_count")?;
        let received = require(event.received_count, KIND, "received_count")?;
        let errors = require(event.error_count, KIND, "error_count")?;

        Ok(vec![
            Metric::gauge("heartbeat.sent_count", sent),
            Metric::gauge("heartbeat.received_count", received),
            Metric::gauge("heartbeat.error_count", errors),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Heartbeat;

    #[test]
    fn test_heartbeat_emits_three_gauges() {
        let envelope = Envelope::from(Heartbeat::new(10, 8, 1));
        let metrics = HeartbeatConverter.convert(&envelope).unwrap();

        assert_eq!(
            metrics,
            vec![
                Metric::gauge("heartbeat.sent_count", 10u64),
                Metric::gauge("heartbeat.received_count", 8u64),
                Metric::gauge("heartbeat.error_count", 1u64),
            ]
        );
    }

    #[test]
    fn test_heartbeat_partial_is_rejected() {
        let envelope = Envelope::from(Heartbeat {
            sent_count: Some(10),
            received_count: Some(8),
            error_count: None,
        });
        let err = HeartbeatConverter.convert(&envelope).unwrap_err();
        assert_eq!(err.to_string(), "heartbeat: missing field 'error_count'");
    }
}
