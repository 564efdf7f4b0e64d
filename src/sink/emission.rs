//! Emission sink: forwards metrics to the daemon or traces them in debug mode.

use std::io::Write;

use strum_macros::{AsRefStr, Display};

use crate::event::Origin;
use crate::metric::Metric;
use crate::sink::{MetricsDaemon, SinkError};

/// How the sink disposes of metrics. Fixed for the lifetime of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EmitMode {
    /// Send metrics to the daemon.
    Forward,
    /// Print metrics to the trace writer; no network I/O.
    Debug,
}

/// Counts from one [`EmissionSink::emit`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    /// Metrics handed to the daemon or written to the trace.
    pub sent: usize,
    /// Metrics whose send or trace write failed.
    pub failed: usize,
}

enum Target<D> {
    Forward(D),
    Debug(Box<dyn Write + Send>),
}

/// Final destination of converted metrics.
///
/// The prefix-by-origin flag is fixed at construction; the sink reads no
/// global state.
pub struct EmissionSink<D> {
    target: Target<D>,
    prefix_by_origin: bool,
}

impl<D: MetricsDaemon> EmissionSink<D> {
    /// Forward metrics to `daemon`, prefixing with `job.index` when
    /// `prefix_by_origin` is set.
    pub fn forward(daemon: D, prefix_by_origin: bool) -> Self {
        Self {
            target: Target::Forward(daemon),
            prefix_by_origin,
        }
    }

    /// Trace metrics to standard output instead of sending them.
    pub fn debug(prefix_by_origin: bool) -> Self {
        Self::debug_to(std::io::stdout(), prefix_by_origin)
    }

    /// Trace metrics to `out` instead of sending them.
    pub fn debug_to(out: impl Write + Send + 'static, prefix_by_origin: bool) -> Self {
        Self {
            target: Target::Debug(Box::new(out)),
            prefix_by_origin,
        }
    }

    pub fn mode(&self) -> EmitMode {
        match self.target {
            Target::Forward(_) => EmitMode::Forward,
            Target::Debug(_) => EmitMode::Debug,
        }
    }

    /// Prefix applied to metrics from `origin`, if any.
    pub fn prefix_for(&self, origin: &Origin) -> Option<String> {
        self.prefix_by_origin.then(|| origin.prefix())
    }

    /// Emit `metrics` in order.
    ///
    /// Individual failures are logged and counted; the remaining metrics
    /// are still emitted.
    pub async fn emit(&mut self, metrics: &[Metric], origin: &Origin) -> EmitSummary {
        let prefix = self.prefix_for(origin);
        let mut summary = EmitSummary::default();

        for metric in metrics {
            let result = match &mut self.target {
                Target::Forward(daemon) => metric.send(daemon, prefix.as_deref()).await,
                Target::Debug(out) => trace(out.as_mut(), metric, prefix.as_deref()),
            };

            match result {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    tracing::warn!(metric = %metric.name(), error = %e, "Failed to emit metric");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

impl<D> std::fmt::Debug for EmissionSink<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.target {
            Target::Forward(_) => EmitMode::Forward,
            Target::Debug(_) => EmitMode::Debug,
        };
        f.debug_struct("EmissionSink")
            .field("mode", &mode)
            .field("prefix_by_origin", &self.prefix_by_origin)
            .finish_non_exhaustive()
    }
}

fn trace(out: &mut dyn Write, metric: &Metric, prefix: Option<&str>) -> Result<(), SinkError> {
    match prefix {
        Some(p) => writeln!(out, "[{p}] {metric}"),
        None => writeln!(out, "{metric}"),
    }
    .and_then(|_| out.flush())
    .map_err(SinkError::Trace)
}
