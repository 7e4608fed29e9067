//! The normalized response envelope.

use crate::request::BoundRequest;
use base64::Engine as _;
use mime::Mime;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Normalized response shape returned from every call.
///
/// Non-2xx statuses are not an error at this layer: the envelope is always
/// returned with `status` set accordingly, so status-code branching stays
/// in caller code.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    /// Decoded body: parsed JSON when the content type carries a JSON
    /// marker, UTF-8 text otherwise, or a base64 descriptor object for
    /// binary bodies.
    pub data: Value,
    /// Numeric HTTP status.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Echo of the bound request that produced this response.
    pub config: BoundRequest,
}

impl ResponseEnvelope {
    /// Whether `status` is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Decode a response body according to its content type.
///
/// JSON media types are parsed (falling back to the raw text when parsing
/// fails); everything else surfaces as text. Bodies that are not valid
/// UTF-8 become a `{ encoding, mimeType, data }` base64 descriptor.
#[must_use]
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Value {
    let Ok(text) = std::str::from_utf8(bytes) else {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        return json!({
            "encoding": "base64",
            "mimeType": content_type,
            "data": b64
        });
    };

    if is_json_content_type(content_type) {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    } else {
        Value::String(text.to_string())
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return false;
    };
    let Ok(m) = ct.parse::<Mime>() else {
        // Tolerate unparsable content types with a plain substring check.
        return ct.to_ascii_lowercase().contains("json");
    };
    m.subtype() == mime::JSON || m.suffix().is_some_and(|s| s == mime::JSON)
}
