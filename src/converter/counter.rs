//! CounterEvent converter.

use crate::converter::traits::{ConversionResult, Converter, require};
use crate::event::{Envelope, EventKind};
use crate::metric::Metric;

const KIND: EventKind = EventKind::CounterEvent;

/// Emits one counter per event: the event's name with its delta.
///
/// Deltas are forwarded as-is; nothing is accumulated across events.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterConverter;

impl Converter for CounterConverter {
    fn kind(&self) -> EventKind {
        KIND
    }

    fn convert(&self, envelope: &Envelope) -> ConversionResult {
        let event = require(envelope.counter_event.as_ref(), KIND, "counter_event")?;
        let name = require(event.name.as_deref(), KIND, "name")?;
        let delta = require(event.delta, KIND, "delta")?;

        Ok(vec![Metric::counter(name, delta)])
    }
}
