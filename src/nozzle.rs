//! Main loop: authenticate, subscribe, then convert and emit until the
//! firehose ends.

use std::sync::Arc;

use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::auth::{AuthError, TokenFetcher};
use crate::config::{AppConfig, ConfigError};
use crate::converter::Dispatcher;
use crate::event::{Envelope, EventKind, Origin};
use crate::feed::{FeedChannels, Firehose, StreamPump, TransportError};
use crate::sink::{EmissionSink, EmitMode, MetricsDaemon, SinkError, StatsdClient};

/// Lifecycle of one nozzle run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NozzleState {
    Authenticating,
    Subscribing,
    Streaming,
    Terminated,
}

/// Fatal failures of a nozzle run.
#[derive(Debug, Error)]
pub enum NozzleError {
    /// Configuration was rejected before any network action.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Token fetch failed; the run cannot start.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The metrics daemon socket could not be opened.
    #[error("statsd unavailable: {0}")]
    Sink(#[from] SinkError),
}

/// Counters for one nozzle run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NozzleStats {
    /// Envelopes received from the feed.
    pub events_received: u64,
    /// Envelopes of kinds without a converter.
    pub unhandled_events: u64,
    /// Envelopes rejected by their converter.
    pub conversion_errors: u64,
    /// Metrics sent to the daemon or traced in debug mode.
    pub metrics_emitted: u64,
    /// Metrics the sink failed to deliver.
    pub metric_failures: u64,
    /// Transport errors reported by the feed.
    pub transport_errors: u64,
}

impl std::fmt::Display for NozzleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events ({} unhandled, {} rejected), {} metrics emitted, {} failed, {} transport errors",
            self.events_received,
            self.unhandled_events,
            self.conversion_errors,
            self.metrics_emitted,
            self.metric_failures,
            self.transport_errors
        )
    }
}

/// The forwarding pipeline.
///
/// The nozzle is the only consumer of the feed channels and the only caller
/// of the dispatcher and sink; envelopes are processed strictly in arrival
/// order and dropped once their metrics are emitted.
#[derive(Debug)]
pub struct Nozzle<D> {
    dispatcher: Dispatcher,
    sink: EmissionSink<D>,
    subscription_id: String,
    event_buffer: usize,
    state: NozzleState,
    stats: NozzleStats,
}

impl Nozzle<StatsdClient> {
    /// Validate `config` and build a nozzle emitting to its statsd daemon.
    ///
    /// In debug mode no socket is opened and metrics are traced to stdout.
    ///
    /// # Errors
    /// Returns `NozzleError::Config` for invalid settings and
    /// `NozzleError::Sink` if the statsd endpoint cannot be reached.
    pub async fn from_config(config: &AppConfig) -> Result<Self, NozzleError> {
        config.validate()?;
        let protocol = config.statsd.statsd_protocol()?;

        let sink = if config.debug {
            tracing::info!("Debug mode: metrics are written to stdout");
            EmissionSink::debug(config.statsd.prefix_job)
        } else {
            let client =
                StatsdClient::connect(&config.statsd.endpoint, &config.statsd.prefix, protocol)
                    .await?;
            EmissionSink::forward(client, config.statsd.prefix_job)
        };

        Ok(Self::new(
            sink,
            &config.doppler.subscription_id,
            config.doppler.event_buffer,
        ))
    }
}

impl<D: MetricsDaemon> Nozzle<D> {
    /// Create a nozzle that emits through `sink`.
    pub fn new(sink: EmissionSink<D>, subscription_id: impl Into<String>, event_buffer: usize) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            sink,
            subscription_id: subscription_id.into(),
            event_buffer,
            state: NozzleState::Authenticating,
            stats: NozzleStats::default(),
        }
    }

    pub fn state(&self) -> NozzleState {
        self.state
    }

    pub fn stats(&self) -> &NozzleStats {
        &self.stats
    }

    pub fn sink_mode(&self) -> EmitMode {
        self.sink.mode()
    }

    /// Run to completion: fetch a token, subscribe, stream until the feed ends.
    ///
    /// # Errors
    /// Returns `NozzleError::Auth` if the token cannot be fetched. No retry
    /// is attempted.
    pub async fn run<T, F>(&mut self, auth: &T, firehose: Arc<F>) -> Result<NozzleStats, NozzleError>
    where
        T: TokenFetcher + ?Sized,
        F: Firehose,
    {
        self.transition(NozzleState::Authenticating);
        let token = auth
            .fetch_token()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch auth token"))?;

        self.transition(NozzleState::Subscribing);
        let (_pump, channels) = StreamPump::spawn(
            firehose,
            self.subscription_id.clone(),
            token,
            self.event_buffer,
        );

        self.stream(channels).await;
        Ok(self.stats.clone())
    }

    /// Consume a subscription until its event channel closes.
    ///
    /// Transport errors are logged as they arrive; any still queued when the
    /// event channel closes are logged before terminating.
    pub async fn stream(&mut self, channels: FeedChannels) {
        self.transition(NozzleState::Streaming);

        let FeedChannels {
            mut events,
            mut errors,
        } = channels;
        let mut errors_open = true;

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Some(envelope) => self.process(envelope).await,
                    None => break,
                },
                reported = errors.recv(), if errors_open => match reported {
                    Some(err) => self.report_transport_error(&err),
                    None => errors_open = false,
                },
            }
        }

        while let Ok(err) = errors.try_recv() {
            self.report_transport_error(&err);
        }

        self.transition(NozzleState::Terminated);
        tracing::info!(stats = %self.stats, "Firehose stream ended");
    }

    /// Dispatch one envelope and emit its metrics.
    async fn process(&mut self, envelope: Envelope) {
        self.stats.events_received += 1;

        let kind = EventKind::of(&envelope);
        if kind.is_unhandled() {
            self.stats.unhandled_events += 1;
            tracing::debug!(event_type = ?envelope.event_type, "Dropping unhandled event kind");
        }

        match self.dispatcher.dispatch(&envelope) {
            Ok(metrics) => {
                if metrics.is_empty() {
                    return;
                }
                let origin = Origin::from(&envelope);
                let summary = self.sink.emit(&metrics, &origin).await;
                self.stats.metrics_emitted += summary.sent as u64;
                self.stats.metric_failures += summary.failed as u64;
            }
            Err(e) => {
                self.stats.conversion_errors += 1;
                tracing::warn!(kind = %kind, error = %e, "Failed to convert event");
            }
        }
    }

    fn report_transport_error(&mut self, err: &TransportError) {
        self.stats.transport_errors += 1;
        tracing::warn!(error = %err, "Firehose transport error");
    }

    fn transition(&mut self, next: NozzleState) {
        tracing::info!(from = %self.state, to = %next, "Nozzle state change");
        self.state = next;
    }
}
