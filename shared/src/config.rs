use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "http://localhost:5002/";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const API_BASE_ENV: &str = "CASEBOOK_API_BASE";
pub const REQUEST_TIMEOUT_ENV: &str = "CASEBOOK_REQUEST_TIMEOUT_MS";

/// Root every API path is joined onto.
///
/// Always http(s) with a host, no userinfo, no query and no fragment. Stored
/// in its normalised string form so the default can be a constant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let reject = |reason: &str| ConfigError::InvalidBaseUrl(format!("{raw:?}: {reason}"));

        let url = Url::parse(raw.trim()).map_err(|e| reject(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(reject("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(reject("missing host"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(reject("must not embed credentials"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(reject("must not carry a query or fragment"));
        }

        Ok(Self(url.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends percent-encoded `segments`, keeping any path prefix the base
    /// has. A trailing slash on the base never produces `//`.
    pub fn join(&self, segments: &[&str]) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.0)?;
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(DEFAULT_API_BASE.to_string())
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the backend lives and how long a request may take.
///
/// The timeout is published to the shell through the view model; the shell
/// owns the HTTP client and enforces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: BaseUrl,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BaseUrl::default(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, request_timeout_ms: u64) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: BaseUrl::parse(base_url)?,
            request_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from `CASEBOOK_API_BASE` and
    /// `CASEBOOK_REQUEST_TIMEOUT_MS`, falling back to the defaults for any
    /// variable that is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match lookup(API_BASE_ENV) {
            Some(raw) => BaseUrl::parse(&raw)?,
            None => BaseUrl::default(),
        };

        let request_timeout_ms = match lookup(REQUEST_TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidTimeout(format!("{raw:?}: {e}")))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let config = Self {
            base_url,
            request_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("must be > 0".into()));
        }
        if self.request_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout(format!(
                "must be at most {MAX_TIMEOUT_MS}ms"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
