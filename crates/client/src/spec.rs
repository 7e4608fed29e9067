//! Spec loading and the normalized document.
//!
//! A definition reference is resolved into a [`SpecDocument`]: the parsed
//! document plus the URL it was fetched from (used to resolve relative
//! `servers` entries). JSON is tried first, YAML as a fallback, so both
//! formats work regardless of file extension or response content type.
//! Only the structural shape needed to enumerate operations is inspected;
//! everything else is passed through opaquely.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// A reference to an OpenAPI definition.
#[derive(Debug, Clone)]
pub enum SpecSource {
    /// Fetched via HTTP GET.
    Url(String),
    /// Read from the local filesystem (JSON or YAML).
    File(PathBuf),
    /// Already-parsed in-memory document.
    Document(Value),
}

impl SpecSource {
    fn location(&self) -> String {
        match self {
            SpecSource::Url(url) => url.clone(),
            SpecSource::File(path) => path.display().to_string(),
            SpecSource::Document(_) => "<in-memory document>".to_string(),
        }
    }
}

impl From<&str> for SpecSource {
    fn from(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            SpecSource::Url(value.to_string())
        } else {
            SpecSource::File(PathBuf::from(value))
        }
    }
}

impl From<String> for SpecSource {
    fn from(value: String) -> Self {
        SpecSource::from(value.as_str())
    }
}

impl From<PathBuf> for SpecSource {
    fn from(value: PathBuf) -> Self {
        SpecSource::File(value)
    }
}

impl From<&Path> for SpecSource {
    fn from(value: &Path) -> Self {
        SpecSource::File(value.to_path_buf())
    }
}

impl From<Value> for SpecSource {
    fn from(value: Value) -> Self {
        SpecSource::Document(value)
    }
}

/// Normalized, immutable OpenAPI document.
///
/// Cloning is cheap: the parsed document is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    root: Arc<Value>,
    source_url: Option<Url>,
}

impl SpecDocument {
    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spec`] if the root is not a JSON object.
    pub fn from_value(root: Value, source_url: Option<Url>) -> Result<Self> {
        if !root.is_object() {
            return Err(Error::Spec(
                "definition root must be an object".to_string(),
            ));
        }
        Ok(Self {
            root: Arc::new(root),
            source_url,
        })
    }

    /// The raw parsed document.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// URL the document was fetched from, when loaded remotely.
    #[must_use]
    pub fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }

    /// The `paths` section, in document order.
    #[must_use]
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }

    /// `info.title`, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.root
            .get("info")
            .and_then(|i| i.get("title"))
            .and_then(Value::as_str)
    }

    /// `info.version`, if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root
            .get("info")
            .and_then(|i| i.get("version"))
            .and_then(Value::as_str)
    }

    /// First `servers` entry URL, if any.
    #[must_use]
    pub fn server_url(&self) -> Option<&str> {
        self.root
            .get("servers")
            .and_then(Value::as_array)
            .and_then(|servers| servers.first())
            .and_then(|s| s.get("url"))
            .and_then(Value::as_str)
    }

    /// Schemas under `components/schemas`, keyed by their full `$ref`
    /// string (`#/components/schemas/{name}`).
    #[must_use]
    pub fn component_schemas(&self) -> HashMap<String, &Value> {
        let Some(schemas) = self
            .root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
        else {
            return HashMap::new();
        };

        schemas
            .iter()
            .map(|(name, schema)| (format!("#/components/schemas/{name}"), schema))
            .collect()
    }

    /// Resolve the base URL for API calls.
    ///
    /// An explicit override wins; otherwise the first `servers` entry is
    /// used, joined against the spec's own URL when it is relative and the
    /// spec was fetched remotely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spec`] when no base URL can be determined or the
    /// candidate is not an absolute http(s) URL.
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> Result<Url> {
        if let Some(explicit) = override_url {
            return Url::parse(explicit)
                .map_err(|e| Error::Spec(format!("invalid baseUrl '{explicit}': {e}")));
        }

        let Some(server_url) = self.server_url() else {
            return Err(Error::Spec(
                "no servers entry in the definition and no baseUrl override".to_string(),
            ));
        };

        if server_url.starts_with("http://") || server_url.starts_with("https://") {
            return Url::parse(server_url)
                .map_err(|e| Error::Spec(format!("invalid server URL '{server_url}': {e}")));
        }

        // OpenAPI allows relative server URLs (e.g. "/api/v3"). When the
        // spec itself was fetched from a URL, resolve against it so common
        // specs just work.
        if let Some(source) = &self.source_url {
            let mut base = source.clone();
            base.set_fragment(None);
            return base.join(server_url).map_err(|e| {
                Error::Spec(format!(
                    "invalid server URL '{server_url}': {e} (set baseUrl explicitly)"
                ))
            });
        }

        Err(Error::Spec(format!(
            "server URL '{server_url}' is relative and the spec was not loaded from a URL (set baseUrl explicitly)"
        )))
    }
}

/// Parse definition text, trying JSON first and YAML as a fallback.
fn parse_text(content: &str, location: &str) -> Result<Value> {
    serde_json::from_str(content)
        .or_else(|_| serde_yaml::from_str(content))
        .map_err(|e: serde_yaml::Error| Error::SpecLoad {
            location: location.to_string(),
            message: format!("failed to parse definition: {e}"),
        })
}

/// Resolve a spec source asynchronously.
pub(crate) async fn load(source: &SpecSource, client: &reqwest::Client) -> Result<SpecDocument> {
    match source {
        SpecSource::Document(value) => SpecDocument::from_value(value.clone(), None),
        SpecSource::File(path) => load_file(path),
        SpecSource::Url(spec_url) => {
            tracing::info!("fetching OpenAPI definition from {spec_url}");
            let url = parse_spec_url(spec_url)?;

            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| fetch_error(spec_url, &e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(spec_url, status.as_u16()));
            }
            let text = response.text().await.map_err(|e| fetch_error(spec_url, &e))?;

            SpecDocument::from_value(parse_text(&text, spec_url)?, Some(url))
        }
    }
}

/// Resolve a spec source on the calling thread.
pub(crate) fn load_blocking(
    source: &SpecSource,
    client: &reqwest::blocking::Client,
) -> Result<SpecDocument> {
    match source {
        SpecSource::Document(value) => SpecDocument::from_value(value.clone(), None),
        SpecSource::File(path) => load_file(path),
        SpecSource::Url(spec_url) => {
            tracing::info!("fetching OpenAPI definition from {spec_url}");
            let url = parse_spec_url(spec_url)?;

            let response = client
                .get(url.clone())
                .send()
                .map_err(|e| fetch_error(spec_url, &e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(spec_url, status.as_u16()));
            }
            let text = response.text().map_err(|e| fetch_error(spec_url, &e))?;

            SpecDocument::from_value(parse_text(&text, spec_url)?, Some(url))
        }
    }
}

fn load_file(path: &Path) -> Result<SpecDocument> {
    tracing::info!("loading OpenAPI definition from {}", path.display());
    let location = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| Error::SpecLoad {
        location: location.clone(),
        message: e.to_string(),
    })?;
    SpecDocument::from_value(parse_text(&content, &location)?, None)
}

fn parse_spec_url(spec_url: &str) -> Result<Url> {
    Url::parse(spec_url).map_err(|e| Error::SpecLoad {
        location: spec_url.to_string(),
        message: format!("invalid URL: {e}"),
    })
}

fn fetch_error(spec_url: &str, e: &reqwest::Error) -> Error {
    Error::SpecLoad {
        location: spec_url.to_string(),
        message: e.to_string(),
    }
}

fn status_error(spec_url: &str, status: u16) -> Error {
    Error::SpecLoad {
        location: spec_url.to_string(),
        message: format!("server responded with HTTP {status}"),
    }
}
