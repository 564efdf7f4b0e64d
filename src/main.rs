//! Nozzle Binary Entry Point
//!
//! Runs the firehose-to-statsd forwarder.
//! Core functionality is provided by the `nozzle` library crate.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use nozzle::{
    AppConfig, DopplerFirehose, Nozzle, UaaTokenFetcher,
    config::parse_duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Nozzle - Firehose to Statsd Forwarder
#[derive(Parser, Debug)]
#[command(name = "nozzle", version, about, long_about = None)]
struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "NOZZLE_CONFIG")]
    config: Option<String>,

    /// Doppler websocket endpoint
    #[arg(long, env = "DOPPLER_ENDPOINT")]
    doppler_endpoint: Option<String>,

    /// UAA endpoint
    #[arg(long, env = "UAA_ENDPOINT")]
    uaa_endpoint: Option<String>,

    /// Firehose subscription id
    #[arg(long, env = "SUBSCRIPTION_ID")]
    subscription_id: Option<String>,

    /// Statsd host:port
    #[arg(long, env = "STATSD_ENDPOINT")]
    statsd_endpoint: Option<String>,

    /// Prefix prepended to every metric name
    #[arg(long, env = "STATSD_PREFIX")]
    statsd_prefix: Option<String>,

    /// Statsd protocol, udp or tcp
    #[arg(long, env = "STATSD_PROTOCOL")]
    statsd_protocol: Option<String>,

    /// Prefix metric names with the originating job.index
    #[arg(
        long,
        env = "PREFIX_JOB",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    prefix_job: Option<bool>,

    /// Deprecated: use --client-id
    #[arg(long, env = "FIREHOSE_USERNAME")]
    username: Option<String>,

    /// Deprecated: use --client-secret
    #[arg(long, env = "FIREHOSE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// UAA client id
    #[arg(long, env = "FIREHOSE_CLIENT_ID")]
    client_id: Option<String>,

    /// UAA client secret
    #[arg(long, env = "FIREHOSE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Skip TLS certificate validation for UAA and Doppler
    #[arg(
        long,
        env = "SKIP_SSL_VALIDATION",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    skip_ssl_validation: Option<bool>,

    /// Print metrics to stdout instead of forwarding them
    #[arg(
        long,
        env = "DEBUG",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    debug: Option<bool>,

    /// Capacity of the event channel between feed and main loop
    #[arg(long, env = "EVENT_BUFFER")]
    event_buffer: Option<usize>,

    /// Delay between firehose reconnect attempts (e.g. 1s, 500ms)
    #[arg(long, env = "RETRY_DELAY", value_parser = parse_duration)]
    retry_delay: Option<Duration>,
}

impl Cli {
    /// Apply CLI/env overrides on top of the file configuration.
    fn apply(self, config: &mut AppConfig) {
        if let Some(endpoint) = self.doppler_endpoint {
            config.doppler.endpoint = endpoint;
        }
        if let Some(endpoint) = self.uaa_endpoint {
            config.uaa.endpoint = endpoint;
        }
        if let Some(id) = self.subscription_id {
            config.doppler.subscription_id = id;
        }
        if let Some(endpoint) = self.statsd_endpoint {
            config.statsd.endpoint = endpoint;
        }
        if let Some(prefix) = self.statsd_prefix {
            config.statsd.prefix = prefix;
        }
        if let Some(protocol) = self.statsd_protocol {
            config.statsd.protocol = protocol;
        }
        if let Some(prefix_job) = self.prefix_job {
            config.statsd.prefix_job = prefix_job;
        }
        if let Some(username) = self.username {
            config.uaa.username = username;
        }
        if let Some(password) = self.password {
            config.uaa.password = password;
        }
        if let Some(client_id) = self.client_id {
            config.uaa.client_id = client_id;
        }
        if let Some(client_secret) = self.client_secret {
            config.uaa.client_secret = client_secret;
        }
        if let Some(skip) = self.skip_ssl_validation {
            config.skip_ssl_validation = skip;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(capacity) = self.event_buffer {
            config.doppler.event_buffer = capacity;
        }
        if let Some(delay) = self.retry_delay {
            config.doppler.retry_delay = delay;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Diagnostics go to stderr; stdout is reserved for debug-mode metric traces
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nozzle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Nozzle - Firehose to Statsd Forwarder");

    let mut cli = Cli::parse();

    let mut config = match cli.config.take() {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };

    // CLI > ENV > config file > defaults
    cli.apply(&mut config);

    tracing::info!(
        "Doppler: {} (subscription {}), UAA: {}, Statsd: {} ({}, prefix '{}')",
        config.doppler.endpoint,
        config.doppler.subscription_id,
        config.uaa.endpoint,
        config.statsd.endpoint,
        config.statsd.protocol,
        config.statsd.prefix,
    );

    // Validates before any network action
    let mut nozzle = Nozzle::from_config(&config).await?;

    let auth = UaaTokenFetcher::with_options(
        &config.uaa.endpoint,
        config.uaa.credentials(),
        config.uaa.timeout,
        config.skip_ssl_validation,
    )?;
    let firehose = Arc::new(
        DopplerFirehose::new(&config.doppler.endpoint)
            .with_skip_tls_verify(config.skip_ssl_validation)
            .with_retries(config.doppler.max_retries, config.doppler.retry_delay),
    );

    tracing::info!("Press Ctrl+C to shutdown");

    tokio::select! {
        result = nozzle.run(&auth, firehose) => {
            let stats = result?;
            tracing::info!("Firehose closed: {}", stats);
        }
        _ = shutdown_signal() => {
            tracing::info!("Stopping at state {}: {}", nozzle.state(), nozzle.stats());
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "nozzle",
            "--statsd-endpoint",
            "127.0.0.1:9125",
            "--statsd-protocol",
            "tcp",
            "--prefix-job",
            "--client-id",
            "nozzle",
            "--event-buffer",
            "16",
            "--retry-delay",
            "250ms",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.statsd.endpoint, "127.0.0.1:9125");
        assert_eq!(config.statsd.protocol, "tcp");
        assert!(config.statsd.prefix_job);
        assert_eq!(config.uaa.client_id, "nozzle");
        assert_eq!(config.doppler.event_buffer, 16);
        assert_eq!(config.doppler.retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_cli_accepts_boolish_flags() {
        let cli = Cli::try_parse_from([
            "nozzle",
            "--debug=1",
            "--prefix-job=f",
            "--skip-ssl-validation=yes",
        ])
        .unwrap();
        assert_eq!(cli.debug, Some(true));
        assert_eq!(cli.prefix_job, Some(false));
        assert_eq!(cli.skip_ssl_validation, Some(true));

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert!(config.debug);
        assert!(!config.statsd.prefix_job);
    }

    #[test]
    fn test_cli_rejects_bad_duration() {
        assert!(Cli::try_parse_from(["nozzle", "--retry-delay", "soon"]).is_err());
    }
}
