//! Stream pump: runs the firehose subscription on its own task.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::Envelope;

/// Non-fatal failure reported by the upstream subscription.
///
/// Purely informational: the pump never acts on these.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connecting or upgrading to the websocket failed.
    #[error("firehose connect failed: {0}")]
    Connect(String),

    /// The websocket stream failed mid-subscription.
    #[error("firehose protocol error: {0}")]
    Protocol(String),

    /// A frame was not a valid envelope.
    #[error("firehose frame decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The subscription ended.
    #[error("firehose closed: {0}")]
    Closed(String),
}

/// Upstream event feed.
///
/// `stream` delivers envelopes and transport errors for as long as the
/// subscription lasts and returns when it ends. Reconnection, if any, is the
/// implementation's business.
#[async_trait::async_trait]
pub trait Firehose: Send + Sync + 'static {
    async fn stream(
        &self,
        subscription_id: &str,
        token: &str,
        events: mpsc::Sender<Envelope>,
        errors: mpsc::UnboundedSender<TransportError>,
    );
}

/// Receiving ends of a subscription.
///
/// `events` closing is the only end-of-stream signal. `errors` is unbounded
/// so reporting a failure never waits on event delivery.
#[derive(Debug)]
pub struct FeedChannels {
    pub events: mpsc::Receiver<Envelope>,
    pub errors: mpsc::UnboundedReceiver<TransportError>,
}

/// Handle to the task running a firehose subscription.
#[derive(Debug)]
pub struct StreamPump {
    handle: JoinHandle<()>,
}

impl StreamPump {
    /// Start the subscription on a dedicated task.
    ///
    /// `capacity` bounds the event hand-off channel.
    pub fn spawn<F: Firehose>(
        firehose: Arc<F>,
        subscription_id: impl Into<String>,
        token: impl Into<String>,
        capacity: usize,
    ) -> (Self, FeedChannels) {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let subscription_id = subscription_id.into();
        let token = token.into();

        let handle = tokio::spawn(async move {
            tracing::info!(subscription = %subscription_id, "Firehose subscription started");
            firehose
                .stream(&subscription_id, &token, event_tx, error_tx)
                .await;
            // Senders were moved into `stream` and are dropped by now.
            tracing::info!(subscription = %subscription_id, "Firehose subscription ended");
        });

        (
            Self { handle },
            FeedChannels {
                events: event_rx,
                errors: error_rx,
            },
        )
    }

    /// Whether the subscription task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the subscription task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CounterEvent, ValueMetric};

    struct ScriptedFirehose {
        envelopes: Vec<Envelope>,
        errors: Vec<TransportError>,
    }

    #[async_trait::async_trait]
    impl Firehose for ScriptedFirehose {
        async fn stream(
            &self,
            _subscription_id: &str,
            token: &str,
            events: mpsc::Sender<Envelope>,
            errors: mpsc::UnboundedSender<TransportError>,
        ) {
            assert_eq!(token, "bearer test");
            for err in &self.errors {
                let _ = errors.send(err.clone());
            }
            for envelope in &self.envelopes {
                if events.send(envelope.clone()).await.is_err() {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_pump_relays_events_in_order_then_closes() {
        let firehose = Arc::new(ScriptedFirehose {
            envelopes: vec![
                Envelope::from(CounterEvent::new("a", 1)),
                Envelope::from(CounterEvent::new("b", 2)),
                Envelope::from(ValueMetric::new("c", 3.0, "x")),
            ],
            errors: vec![],
        });

        let (pump, mut channels) = StreamPump::spawn(firehose, "firehose", "bearer test", 1);

        let mut names = Vec::new();
        while let Some(envelope) = channels.events.recv().await {
            let name = envelope
                .counter_event
                .and_then(|c| c.name)
                .or_else(|| envelope.value_metric.and_then(|v| v.name))
                .unwrap();
            names.push(name);
        }

        assert_eq!(names, vec!["a", "b", "c"]);
        for _ in 0..100 {
            if pump.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(pump.is_finished());
    }

    #[tokio::test]
    async fn test_pump_errors_do_not_block_events() {
        let errors: Vec<TransportError> = (0..64)
            .map(|i| TransportError::Protocol(format!("hiccup {i}")))
            .collect();
        let firehose = Arc::new(ScriptedFirehose {
            envelopes: vec![Envelope::from(CounterEvent::new("a", 1))],
            errors,
        });

        // Nobody reads errors until events are drained.
        let (_pump, mut channels) = StreamPump::spawn(firehose, "firehose", "bearer test", 1);

        assert!(channels.events.recv().await.is_some());
        assert!(channels.events.recv().await.is_none());

        let mut count = 0;
        while let Ok(err) = channels.errors.try_recv() {
            assert!(err.to_string().starts_with("firehose protocol error: hiccup"));
            count += 1;
        }
        assert_eq!(count, 64);
    }

    #[tokio::test]
    async fn test_pump_abort_closes_channels() {
        struct Endless;

        #[async_trait::async_trait]
        impl Firehose for Endless {
            async fn stream(
                &self,
                _subscription_id: &str,
                _token: &str,
                _events: mpsc::Sender<Envelope>,
                _errors: mpsc::UnboundedSender<TransportError>,
            ) {
                std::future::pending::<()>().await;
            }
        }

        let (pump, mut channels) = StreamPump::spawn(Arc::new(Endless), "firehose", "t", 4);
        pump.abort();
        assert!(channels.events.recv().await.is_none());
    }
}
