//! Parameter binder: call arguments + operation descriptor → [`BoundRequest`].
//!
//! Pure and synchronous; nothing here touches the network. Every
//! invocation style funnels through [`bind`], so argument semantics are
//! identical regardless of how the operation was reached.
//!
//! Reserved argument keys: `data` (then `body`) select the request body
//! payload, and `headers` merges ad-hoc headers into the request. Any
//! remaining argument not declared by the operation is passed through as
//! an extra query parameter.

use crate::error::{Error, Result};
use crate::index::{OperationDescriptor, ParamLocation, ParameterSpec};
use openapi_dynamic_http::{BodyPayload, BoundRequest};
use serde_json::{Map, Value};
use std::collections::HashSet;
use url::Url;

use openapi_dynamic_http::request::encode_path_segment;

/// Bind call arguments against an operation, producing the outbound
/// request.
///
/// # Errors
///
/// - [`Error::MissingParameter`] when a required parameter (or required
///   request body) is absent or `null`;
/// - [`Error::Validation`] when a value is incompatible with its
///   location (non-scalar path value, non-object form body, non-object
///   `headers`);
/// - [`Error::Spec`] when the substituted URL cannot be composed.
pub fn bind(
    operation: &OperationDescriptor,
    base_url: &Url,
    args: &Map<String, Value>,
) -> Result<BoundRequest> {
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut cookies: Vec<(String, String)> = Vec::new();

    let mut path = operation.path.clone();

    for param in &operation.parameters {
        let value = present(args.get(param.name.as_str()));
        if value.is_some() {
            consumed.insert(param.name.as_str());
        }

        match param.location {
            ParamLocation::Path => {
                let value = required_value(operation, param, value)?;
                let rendered = scalar_to_string(value).ok_or_else(|| Error::Validation {
                    name: param.name.clone(),
                    message: "path parameters must be scalar values".to_string(),
                })?;
                path = path.replace(
                    &format!("{{{}}}", param.name),
                    &encode_path_segment(&rendered),
                );
            }
            ParamLocation::Query => match value {
                Some(value) => push_query_value(&mut query, &param.name, value),
                None => require_absent_ok(operation, param)?,
            },
            ParamLocation::Header => match value {
                Some(value) => headers.push((param.name.clone(), value_to_string(value))),
                None => require_absent_ok(operation, param)?,
            },
            ParamLocation::Cookie => match value {
                Some(value) => cookies.push((param.name.clone(), value_to_string(value))),
                None => require_absent_ok(operation, param)?,
            },
        }
    }

    if !cookies.is_empty() {
        let folded = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.push(("cookie".to_string(), folded));
    }

    let body = select_body(operation, args, &mut consumed)?;

    if let Some(extra) = present(args.get("headers")) {
        consumed.insert("headers");
        let Some(map) = extra.as_object() else {
            return Err(Error::Validation {
                name: "headers".to_string(),
                message: "the reserved 'headers' argument must be an object".to_string(),
            });
        };
        for (name, value) in map {
            headers.push((name.clone(), value_to_string(value)));
        }
    }

    // Undeclared leftovers pass through as extra query parameters.
    for (name, value) in args {
        if consumed.contains(name.as_str()) || value.is_null() {
            continue;
        }
        push_query_value(&mut query, name, value);
    }

    let url = join_url(base_url, &path)?;

    Ok(BoundRequest {
        method: operation.method.clone(),
        url,
        headers,
        query,
        body,
    })
}

/// `null` arguments are treated as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn required_value<'a>(
    operation: &OperationDescriptor,
    param: &ParameterSpec,
    value: Option<&'a Value>,
) -> Result<&'a Value> {
    value.ok_or_else(|| Error::MissingParameter {
        operation: operation.id.clone(),
        name: param.name.clone(),
    })
}

fn require_absent_ok(operation: &OperationDescriptor, param: &ParameterSpec) -> Result<()> {
    if param.required {
        return Err(Error::MissingParameter {
            operation: operation.id.clone(),
            name: param.name.clone(),
        });
    }
    Ok(())
}

/// Scalars become one pair, arrays repeat the key, objects are
/// JSON-encoded into a single value.
fn push_query_value(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                query.push((name.to_string(), value_to_string(item)));
            }
        }
        other => query.push((name.to_string(), value_to_string(other))),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Select the body payload from the reserved `data`/`body` arguments,
/// serialized per the operation's declared media type.
///
/// An argument already consumed by a declared parameter of the same
/// name is never reused as the body: declared parameters take
/// precedence over the reserved keys.
fn select_body<'a>(
    operation: &OperationDescriptor,
    args: &'a Map<String, Value>,
    consumed: &mut HashSet<&'a str>,
) -> Result<Option<BodyPayload>> {
    let mut payload = None;
    if !consumed.contains("data") {
        if let Some(value) = present(args.get("data")) {
            consumed.insert("data");
            // An undeclared `body` argument is shadowed, not forwarded.
            consumed.insert("body");
            payload = Some(value);
        }
    }
    if payload.is_none() && !consumed.contains("body") {
        if let Some(value) = present(args.get("body")) {
            consumed.insert("body");
            payload = Some(value);
        }
    }

    let Some(value) = payload else {
        if let Some(spec) = &operation.request_body {
            if spec.required {
                return Err(Error::MissingParameter {
                    operation: operation.id.clone(),
                    name: "data".to_string(),
                });
            }
        }
        return Ok(None);
    };

    let media_type = operation
        .request_body
        .as_ref()
        .map_or("application/json", |b| b.media_type.as_str());

    if media_type == "application/x-www-form-urlencoded" {
        let Some(map) = value.as_object() else {
            return Err(Error::Validation {
                name: "data".to_string(),
                message: "form-encoded bodies require an object value".to_string(),
            });
        };
        let pairs = map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
        return Ok(Some(BodyPayload::Form(pairs)));
    }

    if is_json_media_type(media_type) {
        return Ok(Some(BodyPayload::Json(value.clone())));
    }

    // Non-JSON declared media type: send the text verbatim, or the
    // JSON-encoded value when it is not a string.
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(Some(BodyPayload::Raw(raw)))
}

fn is_json_media_type(media_type: &str) -> bool {
    media_type
        .parse::<mime::Mime>()
        .map(|m| {
            m.subtype() == mime::JSON || m.suffix().is_some_and(|s| s == mime::JSON)
        })
        .unwrap_or_else(|_| media_type.contains("json"))
}

fn join_url(base_url: &Url, path: &str) -> Result<Url> {
    let joined = format!("{}{}", base_url.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| Error::Spec(format!("invalid request URL '{joined}': {e}")))
}
