//! ContainerMetric converter.

use crate::converter::traits::{
    ConversionResult, Converter, require, require_finite, sanitize_segment,
};
use crate::event::{Envelope, EventKind};
use crate::metric::Metric;

const KIND: EventKind = EventKind::ContainerMetric;

/// Emits CPU, memory and disk gauges keyed by application and instance.
///
/// Names follow `apps.<app_id>.<resource>.<instance>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerMetricConverter;

impl Converter for ContainerMetricConverter {
    fn kind(&self) -> EventKind {
        KIND
    }

    fn convert(&self, envelope: &Envelope) -> ConversionResult {
        let event = require(envelope.container_metric.as_ref(), KIND, "container_metric")?;
        let app_id = require(event.application_id.as_deref(), KIND, "application_id")?;
        let instance = require(event.instance_index, KIND, "instance_index")?;
        let cpu = require_finite(event.cpu_percentage, KIND, "cpu_percentage")?;
        let memory = require(event.memory_bytes, KIND, "memory_bytes")?;
        let disk = require(event.disk_bytes, KIND, "disk_bytes")?;

        let app = sanitize_segment(app_id);
        Ok(vec![
            Metric::gauge(format!("apps.{app}.cpu.{instance}"), cpu),
            Metric::gauge(format!("apps.{app}.memory_bytes.{instance}"), memory),
            Metric::gauge(format!("apps.{app}.disk_bytes.{instance}"), disk),
        ])
    }
}
