//! Client configuration.
//!
//! Read from the environment by [`ClientConfig::from_env`]; tests and
//! embedders can build one directly with [`ClientConfig::new`].

use std::time::Duration;

use crate::error::ConfigError;

pub const BASE_URL_ENV: &str = "TASKBOARD_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "TASKBOARD_API_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the remote service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when the base URL is unset and
    /// [`ConfigError::InvalidEnv`] when a value cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a caller-supplied lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnv { name: BASE_URL_ENV })?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidEnv {
                name: BASE_URL_ENV,
                value: base_url,
                expected: "an http:// or https:// URL",
            });
        }

        let timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self { base_url, timeout })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidEnv {
            name: TIMEOUT_ENV,
            value: value.to_string(),
            expected: "a positive number of seconds",
        }),
    }
}
