//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::validation::{ConfigError, expand_env_vars, validate_endpoint, validate_url};

// =============================================================================
// Constants
// =============================================================================

/// Default event channel capacity between the stream pump and the main loop.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Default UAA request timeout (10 seconds).
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of firehose reconnect attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default delay between firehose reconnect attempts (1 second).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Credential value that marks the deprecated username/password as unset.
const DEPRECATED_CREDENTIAL_DEFAULT: &str = "admin";

fn default_doppler_endpoint() -> String {
    "wss://doppler.10.244.0.34.xip.io:443".to_string()
}

fn default_subscription_id() -> String {
    "firehose".to_string()
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_uaa_endpoint() -> String {
    "https://uaa.10.244.0.34.xip.io".to_string()
}

fn default_credential() -> String {
    DEPRECATED_CREDENTIAL_DEFAULT.to_string()
}

fn default_auth_timeout() -> Duration {
    DEFAULT_AUTH_TIMEOUT
}

fn default_statsd_endpoint() -> String {
    "10.244.11.2:8125".to_string()
}

fn default_statsd_prefix() -> String {
    "mycf.".to_string()
}

fn default_statsd_protocol() -> String {
    StatsdProtocol::Udp.to_string()
}

// =============================================================================
// Statsd Protocol
// =============================================================================

/// Wire transport used to reach the statsd daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatsdProtocol {
    /// One datagram per metric.
    Udp,
    /// Newline-delimited metrics over a single stream.
    Tcp,
}

// =============================================================================
// Doppler Configuration
// =============================================================================

/// Upstream firehose settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DopplerConfig {
    /// Doppler websocket endpoint.
    #[serde(default = "default_doppler_endpoint")]
    pub endpoint: String,

    /// Firehose subscription identifier.
    #[serde(default = "default_subscription_id")]
    pub subscription_id: String,

    /// Capacity of the event hand-off channel (default: 1024).
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Reconnect attempts before the subscription ends (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between reconnect attempts (default: 1s).
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for DopplerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_doppler_endpoint(),
            subscription_id: default_subscription_id(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

// =============================================================================
// UAA Configuration
// =============================================================================

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UaaConfig {
    /// UAA endpoint.
    #[serde(default = "default_uaa_endpoint")]
    pub endpoint: String,

    /// Deprecated: use `client_id`.
    #[serde(default = "default_credential")]
    pub username: String,

    /// Deprecated: use `client_secret`.
    #[serde(default = "default_credential")]
    pub password: String,

    /// OAuth client id.
    #[serde(default = "default_credential")]
    pub client_id: String,

    /// OAuth client secret.
    #[serde(default = "default_credential")]
    pub client_secret: String,

    /// Token request timeout (default: 10s).
    #[serde(default = "default_auth_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for UaaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_uaa_endpoint(),
            username: default_credential(),
            password: default_credential(),
            client_id: default_credential(),
            client_secret: default_credential(),
            timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }
}

/// Resolved client credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Client id sent as the basic-auth user.
    pub client_id: String,
    /// Client secret sent as the basic-auth password.
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl UaaConfig {
    /// Resolve the credential pair.
    ///
    /// The deprecated username/password only win when they were changed
    /// from their `admin` default.
    pub fn credentials(&self) -> Credentials {
        let client_id = if self.username == DEPRECATED_CREDENTIAL_DEFAULT {
            self.client_id.clone()
        } else {
            self.username.clone()
        };
        let client_secret = if self.password == DEPRECATED_CREDENTIAL_DEFAULT {
            self.client_secret.clone()
        } else {
            self.password.clone()
        };

        Credentials {
            client_id,
            client_secret,
        }
    }
}

// =============================================================================
// Statsd Configuration
// =============================================================================

/// Metrics daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsdConfig {
    /// Statsd `host:port`.
    #[serde(default = "default_statsd_endpoint")]
    pub endpoint: String,

    /// Prefix prepended to every metric name (default: "mycf.").
    #[serde(default = "default_statsd_prefix")]
    pub prefix: String,

    /// Wire protocol, `udp` or `tcp` (default: udp).
    #[serde(default = "default_statsd_protocol")]
    pub protocol: String,

    /// Prefix metric names with the originating `job.index`.
    #[serde(default)]
    pub prefix_job: bool,
}

impl Default for StatsdConfig {
    fn default() -> Self {
        Self {
            endpoint: default_statsd_endpoint(),
            prefix: default_statsd_prefix(),
            protocol: default_statsd_protocol(),
            prefix_job: false,
        }
    }
}

impl StatsdConfig {
    /// Parse the configured protocol name.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for anything but `udp`/`tcp`.
    pub fn statsd_protocol(&self) -> Result<StatsdProtocol, ConfigError> {
        self.protocol.parse::<StatsdProtocol>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "unsupported statsd protocol '{}', expected 'udp' or 'tcp'",
                self.protocol
            ))
        })
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream firehose configuration.
    #[serde(default)]
    pub doppler: DopplerConfig,

    /// Identity provider configuration.
    #[serde(default)]
    pub uaa: UaaConfig,

    /// Metrics daemon configuration.
    #[serde(default)]
    pub statsd: StatsdConfig,

    /// Skip TLS certificate validation for UAA and Doppler.
    #[serde(default)]
    pub skip_ssl_validation: bool,

    /// Print metrics to stdout instead of forwarding them.
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` references are expanded before parsing. Validation is left
    /// to the caller so that CLI overrides can be applied first.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Protocol first: an unknown protocol must fail before anything else
        self.statsd.statsd_protocol()?;

        validate_endpoint("statsd endpoint", &self.statsd.endpoint)?;
        validate_url("doppler endpoint", &self.doppler.endpoint, &["ws", "wss"])?;
        validate_url("uaa endpoint", &self.uaa.endpoint, &["http", "https"])?;

        if self.doppler.subscription_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "subscription id must not be empty".to_string(),
            ));
        }

        if self.doppler.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "doppler event_buffer must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sample_config_parses() {
        let config = AppConfig::from_yaml(include_str!("../../configs/nozzle.yaml")).unwrap();
        assert_eq!(config.doppler.subscription_id, "firehose");
        assert_eq!(config.doppler.retry_delay, DEFAULT_RETRY_DELAY);
        assert_eq!(config.uaa.timeout, DEFAULT_AUTH_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.doppler.subscription_id, "firehose");
        assert_eq!(config.doppler.event_buffer, DEFAULT_EVENT_BUFFER);
        assert_eq!(config.statsd.endpoint, "10.244.11.2:8125");
        assert_eq!(config.statsd.prefix, "mycf.");
        assert_eq!(config.statsd.protocol, "udp");
        assert!(!config.statsd.prefix_job);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_statsd_protocol_parse() {
        assert_eq!(StatsdProtocol::from_str("udp").unwrap(), StatsdProtocol::Udp);
        assert_eq!(StatsdProtocol::from_str("TCP").unwrap(), StatsdProtocol::Tcp);
        assert!(StatsdProtocol::from_str("http").is_err());
        assert_eq!(StatsdProtocol::Tcp.as_ref(), "tcp");
    }

    #[test]
    fn test_config_validation_invalid_protocol() {
        let mut config = AppConfig::default();
        config.statsd.protocol = "quic".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("unsupported statsd protocol 'quic'")
        );
    }

    #[test]
    fn test_config_validation_invalid_endpoints() {
        let mut config = AppConfig::default();
        config.statsd.endpoint = "no-port".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.doppler.endpoint = "http://doppler".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.doppler.event_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_prefer_client_id_when_username_is_default() {
        let uaa = UaaConfig {
            client_id: "nozzle".to_string(),
            client_secret: "s3cret".to_string(),
            ..UaaConfig::default()
        };
        let creds = uaa.credentials();
        assert_eq!(creds.client_id, "nozzle");
        assert_eq!(creds.client_secret, "s3cret");
    }

    #[test]
    fn test_credentials_deprecated_username_wins_when_set() {
        let uaa = UaaConfig {
            username: "legacy".to_string(),
            password: "legacy-pw".to_string(),
            client_id: "nozzle".to_string(),
            client_secret: "s3cret".to_string(),
            ..UaaConfig::default()
        };
        let creds = uaa.credentials();
        assert_eq!(creds.client_id, "legacy");
        assert_eq!(creds.client_secret, "legacy-pw");
        assert!(!format!("{creds:?}").contains("legacy-pw"));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
doppler:
  endpoint: wss://doppler.example.com:443
  retry_delay: 250ms
statsd:
  protocol: tcp
  prefix_job: true
debug: true
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.doppler.endpoint, "wss://doppler.example.com:443");
        assert_eq!(config.doppler.retry_delay, Duration::from_millis(250));
        assert_eq!(config.doppler.subscription_id, "firehose");
        assert_eq!(config.statsd.statsd_protocol().unwrap(), StatsdProtocol::Tcp);
        assert!(config.statsd.prefix_job);
        assert!(config.debug);
        assert_eq!(config.uaa.timeout, DEFAULT_AUTH_TIMEOUT);
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nozzle.yaml");
        std::fs::write(
            &path,
            "uaa:\n  client_id: ${NOZZLE_TEST_MISSING_ID:-from-default}\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.uaa.client_id, "from-default");
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = AppConfig::load("/nonexistent/nozzle.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
