//! Routing of envelopes to their converter.

use crate::converter::traits::{ConversionResult, Converter};
use crate::converter::{
    ContainerMetricConverter, CounterConverter, HeartbeatConverter, HttpStartStopConverter,
    ValueMetricConverter,
};
use crate::event::{Envelope, EventKind};

/// Maps each [`EventKind`] to exactly one converter.
///
/// The table is closed: adding an event kind fails to compile until it is
/// routed here. Kinds without a converter convert to no metrics.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    container: ContainerMetricConverter,
    counter: CounterConverter,
    heartbeat: HeartbeatConverter,
    http: HttpStartStopConverter,
    value: ValueMetricConverter,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the converter for a kind.
    pub fn converter(&self, kind: EventKind) -> Option<&dyn Converter> {
        match kind {
            EventKind::ContainerMetric => Some(&self.container),
            EventKind::CounterEvent => Some(&self.counter),
            EventKind::Heartbeat => Some(&self.heartbeat),
            EventKind::HttpStartStop => Some(&self.http),
            EventKind::ValueMetric => Some(&self.value),
            EventKind::Other => None,
        }
    }

    /// Convert an envelope with the converter for its kind.
    ///
    /// Unrecognized kinds yield `Ok(vec![])`, never an error.
    pub fn dispatch(&self, envelope: &Envelope) -> ConversionResult {
        match self.converter(EventKind::of(envelope)) {
            Some(converter) => converter.convert(envelope),
            None => Ok(Vec::new()),
        }
    }
}
