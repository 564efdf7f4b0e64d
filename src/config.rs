//! Configuration module for the nozzle.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Doppler firehose settings (endpoint, subscription, buffering, reconnects)
//! - UAA settings (endpoint, client credentials, timeout)
//! - Statsd settings (endpoint, prefix, protocol, job prefixing)
//!
//! CLI flags and environment variables are layered on top in `main.rs`.

mod app;
mod validation;

pub use app::{
    AppConfig, Credentials, DopplerConfig, StatsdConfig, StatsdProtocol, UaaConfig,
};
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_AUTH_TIMEOUT, DEFAULT_EVENT_BUFFER, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
