//! Statsd daemon client.
//!
//! Renders metrics in the plain statsd line format and writes them over a
//! single long-lived UDP or TCP socket chosen at startup.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};

use crate::config::StatsdProtocol;
use crate::metric::{MetricKind, MetricValue};

/// Errors that can occur while talking to the metrics daemon.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Socket I/O error.
    #[error("statsd I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint did not resolve to any address.
    #[error("statsd endpoint '{0}' did not resolve")]
    Resolve(String),

    /// Debug trace could not be written.
    #[error("debug trace write failed: {0}")]
    Trace(std::io::Error),

    /// Value has no statsd representation (NaN or infinite).
    #[error("metric '{name}' has non-finite value {value}")]
    NonFinite { name: String, value: f64 },
}

/// A metrics daemon that accepts one metric at a time.
///
/// No acknowledgment is read back; a successful return only means the
/// metric was handed to the transport.
#[async_trait::async_trait]
pub trait MetricsDaemon: Send {
    /// Send one metric, optionally prefixed with `prefix.`.
    async fn send(
        &mut self,
        name: &str,
        value: MetricValue,
        kind: MetricKind,
        prefix: Option<&str>,
    ) -> Result<(), SinkError>;
}

enum StatsdSocket {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// Statsd client over UDP or TCP.
pub struct StatsdClient {
    prefix: String,
    endpoint: String,
    socket: StatsdSocket,
}

impl StatsdClient {
    /// Open the socket for `protocol` towards `endpoint`.
    ///
    /// `prefix` is prepended verbatim to every metric name (e.g. `mycf.`).
    ///
    /// # Errors
    /// Returns `SinkError` if the endpoint cannot be resolved or connected.
    pub async fn connect(
        endpoint: &str,
        prefix: impl Into<String>,
        protocol: StatsdProtocol,
    ) -> Result<Self, SinkError> {
        let addr = tokio::net::lookup_host(endpoint)
            .await?
            .next()
            .ok_or_else(|| SinkError::Resolve(endpoint.to_string()))?;

        let socket = match protocol {
            StatsdProtocol::Udp => {
                let bind: SocketAddr = if addr.is_ipv4() {
                    ([0, 0, 0, 0], 0).into()
                } else {
                    ([0u16; 8], 0).into()
                };
                let socket = UdpSocket::bind(bind).await?;
                socket.connect(addr).await?;
                StatsdSocket::Udp(socket)
            }
            StatsdProtocol::Tcp => StatsdSocket::Tcp(TcpStream::connect(addr).await?),
        };

        tracing::info!(endpoint = %endpoint, protocol = %protocol, "Connected to statsd");

        Ok(Self {
            prefix: prefix.into(),
            endpoint: endpoint.to_string(),
            socket,
        })
    }

    /// Protocol this client was opened with.
    pub fn protocol(&self) -> StatsdProtocol {
        match self.socket {
            StatsdSocket::Udp(_) => StatsdProtocol::Udp,
            StatsdSocket::Tcp(_) => StatsdProtocol::Tcp,
        }
    }
}

impl std::fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsdClient")
            .field("endpoint", &self.endpoint)
            .field("prefix", &self.prefix)
            .field("protocol", &self.protocol())
            .finish()
    }
}

#[async_trait::async_trait]
impl MetricsDaemon for StatsdClient {
    async fn send(
        &mut self,
        name: &str,
        value: MetricValue,
        kind: MetricKind,
        prefix: Option<&str>,
    ) -> Result<(), SinkError> {
        for line in format_lines(&self.prefix, name, value, kind, prefix)? {
            match &mut self.socket {
                StatsdSocket::Udp(socket) => {
                    socket.send(line.as_bytes()).await?;
                }
                StatsdSocket::Tcp(stream) => {
                    stream.write_all(line.as_bytes()).await?;
                    stream.write_all(b"\n").await?;
                }
            }
        }
        Ok(())
    }
}

/// Statsd lines for one metric, without trailing newlines.
///
/// A leading sign on a gauge means "adjust by", so a negative gauge is
/// sent as a reset to zero followed by the signed delta.
fn format_lines(
    global_prefix: &str,
    name: &str,
    value: MetricValue,
    kind: MetricKind,
    prefix: Option<&str>,
) -> Result<Vec<String>, SinkError> {
    if !value.is_finite() {
        return Err(SinkError::NonFinite {
            name: name.to_string(),
            value: value.as_f64(),
        });
    }

    let path = match prefix {
        Some(p) => format!("{global_prefix}{p}.{name}"),
        None => format!("{global_prefix}{name}"),
    };
    let suffix = kind.statsd_type();

    if kind == MetricKind::Gauge && value.is_negative() {
        return Ok(vec![
            format!("{path}:0|{suffix}"),
            format!("{path}:{value}|{suffix}"),
        ]);
    }
    Ok(vec![format!("{path}:{value}|{suffix}")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    fn line(name: &str, value: MetricValue, kind: MetricKind, prefix: Option<&str>) -> Vec<String> {
        format_lines("mycf.", name, value, kind, prefix).unwrap()
    }

    #[test]
    fn test_format_lines() {
        assert_eq!(
            line("requests", MetricValue::Int(7), MetricKind::Counter, None),
            vec!["mycf.requests:7|c"]
        );
        assert_eq!(
            line("memory.used", MetricValue::Float(512.5), MetricKind::Gauge, Some("api.2")),
            vec!["mycf.api.2.memory.used:512.5|g"]
        );
        assert_eq!(
            line("http.response_time.get", MetricValue::Int(250), MetricKind::Timing, None),
            vec!["mycf.http.response_time.get:250|ms"]
        );
    }

    #[test]
    fn test_format_lines_large_counter() {
        assert_eq!(
            line("requests", MetricValue::Int(u64::MAX), MetricKind::Counter, None),
            vec!["mycf.requests:18446744073709551615|c"]
        );
    }

    #[test]
    fn test_format_lines_negative_gauge_resets_first() {
        assert_eq!(
            line("temp", MetricValue::Float(-3.0), MetricKind::Gauge, None),
            vec!["mycf.temp:0|g", "mycf.temp:-3|g"]
        );
        assert_eq!(
            line("temp", MetricValue::Float(0.0), MetricKind::Gauge, None),
            vec!["mycf.temp:0|g"]
        );
    }

    #[test]
    fn test_format_lines_rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = format_lines("", "temp", MetricValue::Float(bad), MetricKind::Gauge, None);
            assert!(matches!(result, Err(SinkError::NonFinite { .. })));
        }
    }

    #[tokio::test]
    async fn test_statsd_udp_send() {
        let server = match UdpSocket::bind("127.0.0.1:0").await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                // Some sandboxed environments disallow binding; skip the test.
                return;
            }
            Err(e) => panic!("Failed to bind test socket: {e}"),
        };
        let addr = server.local_addr().unwrap();

        let mut client = StatsdClient::connect(&addr.to_string(), "mycf.", StatsdProtocol::Udp)
            .await
            .unwrap();
        assert_eq!(client.protocol(), StatsdProtocol::Udp);

        client
            .send("requests", MetricValue::Int(3), MetricKind::Counter, None)
            .await
            .unwrap();

        let mut buf = [0u8; 128];
        let n = server.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"mycf.requests:3|c");
    }

    #[tokio::test]
    async fn test_statsd_tcp_send() {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return,
            Err(e) => panic!("Failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();

        let reader = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = tokio::io::BufReader::new(stream).lines();
            let mut received = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                received.push(line);
                if received.len() == 4 {
                    break;
                }
            }
            received
        });

        let mut client = StatsdClient::connect(&addr.to_string(), "", StatsdProtocol::Tcp)
            .await
            .unwrap();
        client
            .send(
                "memory.used",
                MetricValue::Float(512.0),
                MetricKind::Gauge,
                Some("api.2"),
            )
            .await
            .unwrap();
        client
            .send(
                "http.response_time.get",
                MetricValue::Int(12),
                MetricKind::Timing,
                None,
            )
            .await
            .unwrap();

        client
            .send("temp", MetricValue::Float(-3.0), MetricKind::Gauge, None)
            .await
            .unwrap();

        let received = reader.await.unwrap();
        assert_eq!(
            received,
            vec![
                "api.2.memory.used:512|g".to_string(),
                "http.response_time.get:12|ms".to_string(),
                "temp:0|g".to_string(),
                "temp:-3|g".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_statsd_unresolvable_endpoint() {
        let result = StatsdClient::connect("not-a-valid-endpoint", "", StatsdProtocol::Udp).await;
        assert!(result.is_err());
    }
}
