//! Rotation configuration.
//!
//! Endpoints, session-key domain, timeouts and retry policy. Defaults match a
//! local development stack; override via environment variables.

use std::time::Duration;

use url::Url;

use crate::proof::prover::available_parallelism;

use super::retry::{RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES};

/// Default GraphQL endpoint of the session ledger.
pub const DEFAULT_LEDGER_URL: &str = "http://localhost:8080/graphql";

/// Default base URL of the proof submission service.
pub const DEFAULT_SUBMIT_URL: &str = "http://localhost:3152";

/// Smallest session key handed out by default.
pub const DEFAULT_KEY_MIN: u64 = 2;

/// Largest session key handed out by default.
pub const DEFAULT_KEY_MAX: u64 = 10_000_000;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default budget for one rotation in seconds.
pub const DEFAULT_ROTATION_TIMEOUT_SECS: u64 = 300;

/// Configuration for the rotation orchestrator.
#[derive(Clone, Debug)]
pub struct RotationConfig {
    /// GraphQL endpoint of the session ledger.
    pub ledger_url: Url,
    /// Base URL of the submission service (`/submit-session` is appended).
    pub submit_url: Url,
    /// Smallest selectable session key (inclusive).
    pub session_key_min: u64,
    /// Largest selectable session key (inclusive).
    pub session_key_max: u64,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Total budget for one rotation, proving included.
    pub rotation_timeout: Duration,
    /// Backoff for ledger and submission calls.
    pub retry: RetryPolicy,
    /// Maximum proofs generated concurrently.
    pub max_concurrent_proofs: usize,
}

impl RotationConfig {
    /// Defaults for a local development stack, ignoring the environment.
    pub fn local() -> Result<Self, ConfigError> {
        Ok(Self {
            ledger_url: parse_url("DEVICE_SESSION_LEDGER_URL", DEFAULT_LEDGER_URL)?,
            submit_url: parse_url("DEVICE_SESSION_SUBMIT_URL", DEFAULT_SUBMIT_URL)?,
            session_key_min: DEFAULT_KEY_MIN,
            session_key_max: DEFAULT_KEY_MAX,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rotation_timeout: Duration::from_secs(DEFAULT_ROTATION_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            max_concurrent_proofs: available_parallelism(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DEVICE_SESSION_LEDGER_URL` (default: `http://localhost:8080/graphql`)
    /// - `DEVICE_SESSION_SUBMIT_URL` (default: `http://localhost:3152`)
    /// - `DEVICE_SESSION_KEY_MIN` / `DEVICE_SESSION_KEY_MAX` (default: 2 / 10000000)
    /// - `DEVICE_SESSION_REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `DEVICE_SESSION_ROTATION_TIMEOUT_SECS` (default: 300)
    /// - `DEVICE_SESSION_MAX_RETRIES` (default: 3)
    /// - `DEVICE_SESSION_RETRY_BASE_MS` (default: 200)
    /// - `DEVICE_SESSION_MAX_PROOFS` (default: available cores)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            ledger_url: env_url("DEVICE_SESSION_LEDGER_URL", DEFAULT_LEDGER_URL)?,
            submit_url: env_url("DEVICE_SESSION_SUBMIT_URL", DEFAULT_SUBMIT_URL)?,
            session_key_min: env_parse("DEVICE_SESSION_KEY_MIN", DEFAULT_KEY_MIN)?,
            session_key_max: env_parse("DEVICE_SESSION_KEY_MAX", DEFAULT_KEY_MAX)?,
            request_timeout: Duration::from_secs(env_parse(
                "DEVICE_SESSION_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            rotation_timeout: Duration::from_secs(env_parse(
                "DEVICE_SESSION_ROTATION_TIMEOUT_SECS",
                DEFAULT_ROTATION_TIMEOUT_SECS,
            )?),
            retry: RetryPolicy {
                max_retries: env_parse("DEVICE_SESSION_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
                base_delay: Duration::from_millis(env_parse(
                    "DEVICE_SESSION_RETRY_BASE_MS",
                    DEFAULT_BASE_DELAY_MS,
                )?),
            },
            max_concurrent_proofs: env_parse("DEVICE_SESSION_MAX_PROOFS", available_parallelism())?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the key domain, timeouts and pool size.
    ///
    /// Keys 0 and 1 are reserved (0 means "no session").
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_key_min < DEFAULT_KEY_MIN || self.session_key_min > self.session_key_max {
            return Err(ConfigError::InvalidKeyDomain {
                min: self.session_key_min,
                max: self.session_key_max,
            });
        }
        for (var, timeout) in [
            ("DEVICE_SESSION_REQUEST_TIMEOUT_SECS", self.request_timeout),
            ("DEVICE_SESSION_ROTATION_TIMEOUT_SECS", self.rotation_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidValue(
                    var.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }
        if self.max_concurrent_proofs == 0 {
            return Err(ConfigError::InvalidValue(
                "DEVICE_SESSION_MAX_PROOFS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of selectable session keys.
    pub fn key_domain_size(&self) -> u64 {
        self.session_key_max - self.session_key_min + 1
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_parse<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// A numeric variable does not parse or is out of range.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
    /// Session-key domain is empty or includes reserved keys.
    #[error("invalid session key domain [{min}, {max}]")]
    InvalidKeyDomain {
        /// Configured minimum.
        min: u64,
        /// Configured maximum.
        max: u64,
    },
}
