//! Metric values produced by converters.

use strum_macros::{AsRefStr, Display};

use crate::sink::{MetricsDaemon, SinkError};

/// Statsd semantics of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    /// Delta added to a counter.
    Counter,
    /// Point-in-time snapshot.
    Gauge,
    /// Duration in milliseconds.
    Timing,
}

impl MetricKind {
    /// Statsd type suffix (`c`, `g`, `ms`).
    pub fn statsd_type(&self) -> &'static str {
        match self {
            Self::Counter => "c",
            Self::Gauge => "g",
            Self::Timing => "ms",
        }
    }
}

/// Numeric payload of a metric.
///
/// Integral sources (counter deltas, timings, byte and event counts) stay
/// integers end to end so 64-bit values render exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(u64),
    Float(f64),
}

impl MetricValue {
    /// Lossy conversion for callers that only need magnitude.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(n) => n as f64,
            Self::Float(f) => f,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(*self, Self::Float(f) if f < 0.0)
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Int(_) => true,
            Self::Float(f) => f.is_finite(),
        }
    }
}

impl From<u64> for MetricValue {
    fn from(n: u64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for MetricValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl PartialEq<f64> for MetricValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == *other
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One named measurement destined for the metrics daemon.
///
/// Name, value and kind are fixed at construction; the main loop only
/// passes metrics through to [`Metric::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    value: MetricValue,
    kind: MetricKind,
}

impl Metric {
    /// Counter delta.
    pub fn counter(name: impl Into<String>, delta: u64) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Int(delta),
            kind: MetricKind::Counter,
        }
    }

    /// Gauge snapshot, integral or fractional.
    pub fn gauge(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: MetricKind::Gauge,
        }
    }

    /// Timing in milliseconds.
    pub fn timing(name: impl Into<String>, millis: u64) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Int(millis),
            kind: MetricKind::Timing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> MetricValue {
        self.value
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Send this metric to the daemon with an optional name prefix.
    pub async fn send<D>(&self, daemon: &mut D, prefix: Option<&str>) -> Result<(), SinkError>
    where
        D: MetricsDaemon + ?Sized,
    {
        daemon
            .send(&self.name, self.value, self.kind, prefix)
            .await
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}={}", self.kind, self.name, self.value)
    }
}
