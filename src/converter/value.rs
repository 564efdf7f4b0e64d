//! ValueMetric converter.

use crate::converter::traits::{ConversionResult, Converter, require, require_finite};
use crate::event::{Envelope, EventKind};
use crate::metric::Metric;

const KIND: EventKind = EventKind::ValueMetric;

/// Emits one gauge per event named after the reported metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMetricConverter;

impl Converter for ValueMetricConverter {
    fn kind(&self) -> EventKind {
        KIND
    }

    fn convert(&self, envelope: &Envelope) -> ConversionResult {
        let event = require(envelope.value_metric.as_ref(), KIND, "value_metric")?;
        let name = require(event.name.as_deref(), KIND, "name")?;
        let value = require_finite(event.value, KIND, "value")?;

        Ok(vec![Metric::gauge(name, value)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ValueMetric;
    use crate::metric::MetricKind;

    #[test]
    fn test_value_metric_converts_to_gauge() {
        let envelope = Envelope::from(ValueMetric::new("memory.used", 512.0, "MiB"));
        let metrics = ValueMetricConverter.convert(&envelope).unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name(), "memory.used");
        assert_eq!(metrics[0].value(), 512.0);
        assert_eq!(metrics[0].kind(), MetricKind::Gauge);
    }

    #[test]
    fn test_value_metric_is_idempotent() {
        let envelope = Envelope::from(ValueMetric::new("cpu", 0.125, "percent"));
        let first = ValueMetricConverter.convert(&envelope).unwrap();
        let second = ValueMetricConverter.convert(&envelope).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first[0].value().as_f64().to_bits(),
            second[0].value().as_f64().to_bits()
        );
    }

    #[test]
    fn test_value_metric_negative_is_kept() {
        let envelope = Envelope::from(ValueMetric::new("temperature", -3.0, "C"));
        let metrics = ValueMetricConverter.convert(&envelope).unwrap();
        assert_eq!(metrics, vec![Metric::gauge("temperature", -3.0)]);
    }

    #[test]
    fn test_value_metric_non_finite_is_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let envelope = Envelope::from(ValueMetric::new("temperature", bad, "C"));
            let err = ValueMetricConverter.convert(&envelope).unwrap_err();
            assert!(matches!(
                err,
                crate::converter::ConvertError::InvalidField { field: "value", .. }
            ));
        }
    }

    #[test]
    fn test_value_metric_missing_name() {
        let envelope = Envelope::from(ValueMetric {
            value: Some(1.0),
            ..ValueMetric::default()
        });
        let err = ValueMetricConverter.convert(&envelope).unwrap_err();
        assert_eq!(err.to_string(), "value_metric: missing field 'name'");
    }
}
