//! Client configuration.
//!
//! A [`ClientConfig`] holds the credentials and connection settings of one
//! [`ApiClient`](crate::client::ApiClient). It can be built in code, parsed
//! from a TOML file or read from `CAREHQ_*` environment variables.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Base URL of the production API.
pub const DEFAULT_BASE_URL: &str = "https://api.carehq.co.uk";

pub const ENV_ACCOUNT_ID: &str = "CAREHQ_ACCOUNT_ID";
pub const ENV_API_KEY: &str = "CAREHQ_API_KEY";
pub const ENV_API_SECRET: &str = "CAREHQ_API_SECRET";
pub const ENV_BASE_URL: &str = "CAREHQ_API_BASE_URL";
pub const ENV_TIMEOUT: &str = "CAREHQ_TIMEOUT";

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("timeout of {0} seconds is out of range")]
    TimeoutOutOfRange(f64),

    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
}

/// Credentials and connection settings for the API.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// The account the API key relates to.
    pub account_id: String,
    /// Key used to authenticate calls to the account.
    pub api_key: String,
    /// Secret used to sign every request. Never sent over the wire.
    pub api_secret: String,
    /// Root URL of the API, without the `/v1` segment.
    pub base_url: String,
    /// Whole-request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// On-disk layout of the TOML configuration.
#[derive(Debug, Deserialize)]
struct FileConfig {
    account_id: String,
    api_key: String,
    api_secret: String,
    #[serde(default)]
    base_url: Option<String>,
    /// Seconds; non-positive disables the explicit timeout.
    #[serde(default)]
    timeout: Option<f64>,
}

impl ClientConfig {
    /// Create a configuration pointing at the production API with no
    /// explicit timeout.
    pub fn new(
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the timeout in seconds. A non-positive, non-finite or
    /// unrepresentable value clears it.
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// account_id = "acc"
    /// api_key = "key"
    /// api_secret = "secret"
    /// base_url = "https://api.carehq.co.uk"  # optional
    /// timeout = 10.0                          # optional, seconds
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(source)?;
        let mut config = Self::new(file.account_id, file.api_key, file.api_secret);
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = file.timeout {
            config.timeout = checked_timeout(secs)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load from the process environment (`CAREHQ_ACCOUNT_ID`,
    /// `CAREHQ_API_KEY`, `CAREHQ_API_SECRET`, and optionally
    /// `CAREHQ_API_BASE_URL` and `CAREHQ_TIMEOUT`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source using the same names as
    /// [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));

        let mut config = Self::new(
            required(ENV_ACCOUNT_ID)?,
            required(ENV_API_KEY)?,
            required(ENV_API_SECRET)?,
        );
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            let secs: f64 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: ENV_TIMEOUT,
                value: raw.clone(),
            })?;
            config.timeout = checked_timeout(secs)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is absolute and parseable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url)?;
        Ok(())
    }

    /// `{base_url}/v1/{path}`, tolerating a trailing slash on the base and a
    /// leading slash on the path.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Like [`timeout_from_secs`], but a positive value too large for a
/// `Duration` is an error instead of silently disabling the timeout.
fn checked_timeout(secs: f64) -> Result<Option<Duration>, ConfigError> {
    if secs > 0.0 && secs.is_finite() {
        return Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| ConfigError::TimeoutOutOfRange(secs));
    }
    Ok(None)
}
