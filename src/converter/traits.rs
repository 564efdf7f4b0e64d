//! Core converter trait and error types.

use thiserror::Error;

use crate::event::{Envelope, EventKind};
use crate::metric::Metric;

/// Outcome of converting one envelope: zero or more metrics, or a failure.
pub type ConversionResult = Result<Vec<Metric>, ConvertError>;

/// Errors that can occur while converting an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// A field the metric formula needs is absent.
    #[error("{kind}: missing field '{field}'")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    /// A field is present but outside its valid range.
    #[error("{kind}: invalid field '{field}': {reason}")]
    InvalidField {
        kind: EventKind,
        field: &'static str,
        reason: String,
    },

    /// Stop timestamp precedes the start timestamp.
    #[error("http_start_stop: stop timestamp {stop} precedes start timestamp {start}")]
    InvertedTimestamps { start: i64, stop: i64 },
}

/// Converts one envelope kind into metrics.
///
/// # Contract
///
/// - Implementations are pure: converting the same envelope twice yields
///   identical metrics.
/// - A structurally absent required field yields a [`ConvertError`]; no
///   partially built metric list is ever returned.
/// - Implementations never panic on decoded input.
pub trait Converter: Send + Sync {
    /// The event kind this converter accepts.
    fn kind(&self) -> EventKind;

    /// Convert one envelope of [`Converter::kind`] into metrics.
    fn convert(&self, envelope: &Envelope) -> ConversionResult;
}

/// Unwrap a required field or report it missing.
pub(crate) fn require<T>(
    value: Option<T>,
    kind: EventKind,
    field: &'static str,
) -> Result<T, ConvertError> {
    value.ok_or(ConvertError::MissingField { kind, field })
}

/// Unwrap a required float field, rejecting NaN and infinities.
pub(crate) fn require_finite(
    value: Option<f64>,
    kind: EventKind,
    field: &'static str,
) -> Result<f64, ConvertError> {
    let value = require(value, kind, field)?;
    if !value.is_finite() {
        return Err(ConvertError::InvalidField {
            kind,
            field,
            reason: format!("{value} is not a finite number"),
        });
    }
    Ok(value)
}

/// Replace characters that would break a dotted metric path.
pub(crate) fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require(Some(3), EventKind::CounterEvent, "delta").unwrap(), 3);
    }

    #[test]
    fn test_require_missing() {
        let err = require::<u64>(None, EventKind::CounterEvent, "delta").unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingField {
                kind: EventKind::CounterEvent,
                field: "delta"
            }
        );
        assert_eq!(err.to_string(), "counter_event: missing field 'delta'");
    }

    #[test]
    fn test_require_finite() {
        let kind = EventKind::ValueMetric;
        assert_eq!(require_finite(Some(-3.5), kind, "value").unwrap(), -3.5);
        assert!(matches!(
            require_finite(None, kind, "value"),
            Err(ConvertError::MissingField { .. })
        ));
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                require_finite(Some(bad), kind, "value"),
                Err(ConvertError::InvalidField { field: "value", .. })
            ));
        }
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(
            sanitize_segment("6a1b-22c.example/x"),
            "6a1b-22c_example_x"
        );
        assert_eq!(sanitize_segment("plain_id"), "plain_id");
    }
}
