//! Doppler firehose over websocket.
//!
//! Connects to `{endpoint}/firehose/{subscription_id}` with the bearer token
//! in the `Authorization` header. Each binary frame carries one
//! protobuf-encoded [`Envelope`].

use std::time::Duration;

use futures::StreamExt;
use prost::Message as _;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::event::Envelope;
use crate::feed::{Firehose, TransportError};

type FirehoseSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connected session stopped reading frames.
enum SessionEnd {
    /// Server sent a close frame.
    Closed,
    /// Consumer dropped the event channel.
    ConsumerGone,
    /// Connection failed; worth reconnecting.
    Lost(TransportError),
}

/// Firehose client for a Doppler websocket endpoint.
#[derive(Debug, Clone)]
pub struct DopplerFirehose {
    endpoint: String,
    skip_tls_verify: bool,
    max_retries: u32,
    retry_delay: Duration,
}

impl DopplerFirehose {
    /// Create a client for the Doppler endpoint (`ws://` or `wss://`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            skip_tls_verify: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Accept invalid TLS certificates and host names.
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Set reconnect attempts and the delay between them.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Subscription URL for `subscription_id`.
    pub fn firehose_url(&self, subscription_id: &str) -> String {
        format!(
            "{}/firehose/{}",
            self.endpoint.trim_end_matches('/'),
            subscription_id
        )
    }

    async fn connect(&self, url: &str, token: &str) -> Result<FirehoseSocket, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let auth = HeaderValue::from_str(token)
            .map_err(|e| TransportError::Connect(format!("invalid token header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let connector = if self.skip_tls_verify {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        let (socket, _response) =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(socket)
    }
}

#[async_trait::async_trait]
impl Firehose for DopplerFirehose {
    async fn stream(
        &self,
        subscription_id: &str,
        token: &str,
        events: mpsc::Sender<Envelope>,
        errors: mpsc::UnboundedSender<TransportError>,
    ) {
        let url = self.firehose_url(subscription_id);
        let mut failures = 0u32;

        loop {
            match self.connect(&url, token).await {
                Ok(socket) => {
                    tracing::info!(url = %url, "Connected to firehose");
                    failures = 0;
                    match read_frames(socket, &events, &errors).await {
                        SessionEnd::Closed | SessionEnd::ConsumerGone => return,
                        SessionEnd::Lost(e) => report(&errors, e),
                    }
                }
                Err(e) => report(&errors, e),
            }

            failures += 1;
            if failures > self.max_retries {
                report(
                    &errors,
                    TransportError::Closed(format!(
                        "giving up after {} failed attempts",
                        failures
                    )),
                );
                return;
            }

            tracing::debug!(attempt = failures, delay = ?self.retry_delay, "Reconnecting to firehose");
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

async fn read_frames(
    mut socket: FirehoseSocket,
    events: &mpsc::Sender<Envelope>,
    errors: &mpsc::UnboundedSender<TransportError>,
) -> SessionEnd {
    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Binary(data)) => match Envelope::decode(data.as_slice()) {
                Ok(envelope) => {
                    if events.send(envelope).await.is_err() {
                        return SessionEnd::ConsumerGone;
                    }
                }
                Err(e) => report(errors, TransportError::Decode(e)),
            },
            Ok(Message::Close(frame)) => {
                tracing::info!(frame = ?frame, "Firehose closed by server");
                return SessionEnd::Closed;
            }
            Ok(_) => {}
            Err(e) => return SessionEnd::Lost(TransportError::Protocol(e.to_string())),
        }
    }

    SessionEnd::Lost(TransportError::Closed(
        "stream ended without close frame".to_string(),
    ))
}

fn report(errors: &mpsc::UnboundedSender<TransportError>, err: TransportError) {
    if errors.send(err).is_err() {
        tracing::debug!("Transport error dropped, no receiver");
    }
}
