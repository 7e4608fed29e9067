//! Transport configuration.
//!
//! These options are forwarded verbatim to the underlying `reqwest` client;
//! the binding layer interprets none of them.

use crate::error::{Result, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default per-request timeout when the config does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pass-through HTTP client options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    /// Override the base URL inferred from the spec's `servers` list.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds. `0` disables the timeout entirely.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Headers attached to every outbound request.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Proxy URL for all outbound requests.
    #[serde(default)]
    pub proxy: Option<String>,

    /// `User-Agent` override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TransportConfig {
    /// Effective request timeout: `Some(0)` means "disabled".
    #[must_use]
    pub fn effective_timeout(&self) -> Option<Duration> {
        match self.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        }
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| TransportError::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TransportError::Config(format!("invalid header value for '{name}': {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Build the async `reqwest` client for a facade.
///
/// # Errors
///
/// Returns [`TransportError::Config`] if the options are rejected by the
/// client builder (invalid proxy URL, malformed header, TLS setup failure).
pub fn build_async_client(config: &TransportConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().default_headers(config.default_headers()?);

    if let Some(timeout) = config.effective_timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| TransportError::Config(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(ua) = &config.user_agent {
        builder = builder.user_agent(ua);
    }

    builder
        .build()
        .map_err(|e| TransportError::Config(e.to_string()))
}

/// Build the blocking `reqwest` client for a facade.
///
/// # Errors
///
/// Same failure modes as [`build_async_client`].
pub fn build_blocking_client(config: &TransportConfig) -> Result<reqwest::blocking::Client> {
    let mut builder =
        reqwest::blocking::Client::builder().default_headers(config.default_headers()?);

    if let Some(timeout) = config.effective_timeout() {
        builder = builder.timeout(timeout);
    } else {
        builder = builder.timeout(None);
    }
    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| TransportError::Config(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(ua) = &config.user_agent {
        builder = builder.user_agent(ua);
    }

    builder
        .build()
        .map_err(|e| TransportError::Config(e.to_string()))
}
