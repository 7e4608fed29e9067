//! Bound outbound requests.
//!
//! A [`BoundRequest`] is the output of the binding layer: method, resolved
//! URL, headers, query pairs, and an optional body payload. It lives for
//! exactly one call and is echoed back to the caller inside the response
//! envelope's `config` field.

use reqwest::Method;
use serde::{Serialize, Serializer};
use serde_json::Value;
use url::Url;

/// Request body payload, selected by the operation's declared media type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BodyPayload {
    /// JSON-encoded body (`application/json` and friends; also the default).
    Json(Value),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
    /// Raw text body for non-JSON, non-form media types.
    Raw(String),
}

/// One fully bound outbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundRequest {
    /// HTTP method.
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Resolved URL (base + substituted path template), without the query.
    pub url: Url,
    /// Request headers contributed by the binding layer.
    pub headers: Vec<(String, String)>,
    /// Query pairs, encoded at dispatch time.
    pub query: Vec<(String, String)>,
    /// Optional body payload.
    pub body: Option<BodyPayload>,
}

impl BoundRequest {
    /// The final URL with the percent-encoded query string applied.
    ///
    /// An existing query on the base URL is preserved; bound pairs are
    /// appended after it.
    #[must_use]
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.query.is_empty() {
            return url;
        }

        let mut encoded = url.query().map(str::to_string).unwrap_or_default();
        for (key, value) in &self.query {
            if !encoded.is_empty() {
                encoded.push('&');
            }
            encoded.push_str(&encode_query_component(key));
            encoded.push('=');
            encoded.push_str(&encode_query_component(value));
        }
        url.set_query(Some(&encoded));
        url
    }
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// Percent-encode a query key or value.
///
/// Everything outside RFC3986 unreserved is encoded, including `&` and `=`,
/// so the pairs can be joined into a query string without corruption.
#[must_use]
pub fn encode_query_component(s: &str) -> String {
    percent_encode(s)
}

/// Percent-encode a path segment value.
///
/// A `/` inside a path parameter value is encoded, never left raw, so one
/// parameter can never span multiple path segments.
#[must_use]
pub fn encode_path_segment(s: &str) -> String {
    percent_encode(s)
}

fn percent_encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}
