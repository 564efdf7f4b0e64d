//! Event classification and origin identity.

use strum_macros::{AsRefStr, Display, EnumString};

use super::envelope::{Envelope, EventType};

/// Kinds of firehose events the nozzle knows how to convert.
///
/// Every envelope type outside the five convertible kinds, including
/// numeric tags this build does not know, classifies as [`EventKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    ContainerMetric,
    CounterEvent,
    Heartbeat,
    HttpStartStop,
    ValueMetric,
    Other,
}

impl EventKind {
    /// Classify an envelope by its type tag.
    pub fn of(envelope: &Envelope) -> Self {
        let Some(raw) = envelope.event_type else {
            return Self::Other;
        };

        match EventType::try_from(raw) {
            Ok(EventType::ContainerMetric) => Self::ContainerMetric,
            Ok(EventType::CounterEvent) => Self::CounterEvent,
            Ok(EventType::Heartbeat) => Self::Heartbeat,
            Ok(EventType::HttpStartStop) => Self::HttpStartStop,
            Ok(EventType::ValueMetric) => Self::ValueMetric,
            Ok(
                EventType::HttpStart
                | EventType::HttpStop
                | EventType::LogMessage
                | EventType::Error,
            )
            | Err(_) => Self::Other,
        }
    }

    /// Whether envelopes of this kind are dropped without conversion.
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Other)
    }
}

/// Job name and instance index of the process that emitted an event.
///
/// Both fields may be empty when the envelope omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub job: String,
    pub index: String,
}

impl Origin {
    /// Create an origin from its parts.
    pub fn new(job: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            index: index.into(),
        }
    }

    /// Metric prefix for this origin: `job.index`.
    pub fn prefix(&self) -> String {
        format!("{}.{}", self.job, self.index)
    }
}

impl From<&Envelope> for Origin {
    fn from(envelope: &Envelope) -> Self {
        Self::new(envelope.job(), envelope.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CounterEvent, ValueMetric};
    use std::str::FromStr;

    #[test]
    fn test_event_kind_of_recognized() {
        let envelope = Envelope::from(ValueMetric::new("memory.used", 1.0, "MiB"));
        assert_eq!(EventKind::of(&envelope), EventKind::ValueMetric);

        let envelope = Envelope::from(CounterEvent::new("requests", 1));
        assert_eq!(EventKind::of(&envelope), EventKind::CounterEvent);
    }

    #[test]
    fn test_event_kind_of_unrecognized() {
        let log = Envelope {
            event_type: Some(EventType::LogMessage as i32),
            ..Envelope::default()
        };
        assert_eq!(EventKind::of(&log), EventKind::Other);

        let unknown = Envelope {
            event_type: Some(99),
            ..Envelope::default()
        };
        assert_eq!(EventKind::of(&unknown), EventKind::Other);

        assert_eq!(EventKind::of(&Envelope::default()), EventKind::Other);
        assert!(EventKind::Other.is_unhandled());
        assert!(!EventKind::Heartbeat.is_unhandled());
    }

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(EventKind::HttpStartStop.to_string(), "http_start_stop");
        assert_eq!(EventKind::ContainerMetric.as_ref(), "container_metric");
        assert_eq!(
            EventKind::from_str("counter_event").unwrap(),
            EventKind::CounterEvent
        );
    }

    #[test]
    fn test_origin_from_envelope() {
        let envelope = Envelope::from(CounterEvent::new("requests", 1)).with_job("api", "2");
        let origin = Origin::from(&envelope);
        assert_eq!(origin, Origin::new("api", "2"));
        assert_eq!(origin.prefix(), "api.2");

        let bare = Origin::from(&Envelope::default());
        assert_eq!(bare.job, "");
        assert_eq!(bare.index, "");
    }
}
