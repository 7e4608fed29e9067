//! Operation index: one descriptor per `paths × methods` entry.
//!
//! Built once per loaded document, pure and immutable afterwards. Lookup
//! by operation id is O(1); the `operations`/`paths` listings preserve
//! document order.

use crate::error::{Error, Result};
use crate::spec::SpecDocument;
use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// HTTP methods recognized under a path item, in enumeration order.
pub const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "options", "head"];

/// Where a declared parameter goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// One declared parameter.
///
/// `schema` is opaque type info used only for serialization and tool
/// hints; it is never validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub description: Option<String>,
}

/// Declared request body: selected media type plus its (opaque) schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub media_type: String,
    pub required: bool,
    pub schema: Value,
    pub description: Option<String>,
}

/// One resolved operation. Immutable after index build.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    /// Unique operation id: the spec's `operationId`, or a deterministic
    /// `{method}_{path}` fallback when absent.
    pub id: String,
    pub method: Method,
    /// Path template with `{name}` placeholders.
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
}

/// Index of all operations in a document.
#[derive(Debug, Clone)]
pub struct OperationIndex {
    operations: Vec<Arc<OperationDescriptor>>,
    by_id: HashMap<String, Arc<OperationDescriptor>>,
    paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationObject {
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<Value>,
    #[serde(default)]
    request_body: Option<RequestBodyObject>,
}

#[derive(Debug, Deserialize)]
struct RequestBodyObject {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Map<String, Value>,
}

impl OperationIndex {
    /// Build the index from a loaded document.
    ///
    /// Pure derivation: iterating `paths` in document order and methods in
    /// [`HTTP_METHODS`] order, one descriptor per present method entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spec`] if the document lacks a `paths` section, a
    /// path/method/parameter entry is structurally malformed, or an
    /// explicit `operationId` is duplicated.
    pub fn build(document: &SpecDocument) -> Result<Self> {
        let Some(paths) = document.paths() else {
            return Err(Error::Spec("document has no 'paths' section".to_string()));
        };

        let mut operations: Vec<Arc<OperationDescriptor>> = Vec::new();
        let mut by_id: HashMap<String, Arc<OperationDescriptor>> = HashMap::new();
        let mut path_templates: Vec<String> = Vec::new();

        // Collect explicit ids up front: explicit-vs-explicit duplicates
        // are a structural error, and derived fallback ids must avoid
        // every explicit id regardless of document position.
        let explicit_ids = collect_explicit_ids(paths)?;
        let mut used_ids = explicit_ids;

        for (path, path_item) in paths {
            let Some(item) = path_item.as_object() else {
                return Err(Error::Spec(format!(
                    "path item '{path}' is not an object"
                )));
            };

            let path_level_params = match item.get("parameters") {
                Some(raw) => parse_parameters(raw, &format!("path item '{path}'"))?,
                None => Vec::new(),
            };

            let mut saw_operation = false;
            for method in HTTP_METHODS {
                let Some(raw_op) = item.get(method) else {
                    continue;
                };
                saw_operation = true;

                let context = format!("{} {path}", method.to_uppercase());
                let op: OperationObject = serde_json::from_value(raw_op.clone())
                    .map_err(|e| Error::Spec(format!("malformed operation at {context}: {e}")))?;

                let op_params = parse_parameters_from_values(&op.parameters, &context)?;
                let parameters = merge_parameters(path_level_params.clone(), op_params);

                let id = match &op.operation_id {
                    Some(explicit) => explicit.clone(),
                    None => reserve_unique_id(&mut used_ids, &derive_operation_id(method, path)),
                };

                let descriptor = Arc::new(OperationDescriptor {
                    id: id.clone(),
                    method: resolve_http_method(method)?,
                    path: path.clone(),
                    summary: op.summary,
                    description: op.description,
                    parameters,
                    request_body: op.request_body.map(select_request_body),
                });

                by_id.insert(id, Arc::clone(&descriptor));
                operations.push(descriptor);
            }

            if saw_operation {
                path_templates.push(path.clone());
            }
        }

        Ok(Self {
            operations,
            by_id,
            paths: path_templates,
        })
    }

    /// Descriptor for one operation id.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&Arc<OperationDescriptor>> {
        self.by_id.get(operation_id)
    }

    /// All operation ids, in document order.
    #[must_use]
    pub fn operation_ids(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.id.as_str()).collect()
    }

    /// All descriptors, in document order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<OperationDescriptor>> {
        self.operations.iter()
    }

    /// Path templates that carry at least one operation, in document order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Number of indexed operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn collect_explicit_ids(paths: &Map<String, Value>) -> Result<HashSet<String>> {
    let mut explicit: HashSet<String> = HashSet::new();
    for (path, path_item) in paths {
        for method in HTTP_METHODS {
            let Some(id) = path_item
                .get(method)
                .and_then(|op| op.get("operationId"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            if !explicit.insert(id.to_string()) {
                return Err(Error::Spec(format!(
                    "duplicate operationId '{id}' (at {} {path})",
                    method.to_uppercase()
                )));
            }
        }
    }
    Ok(explicit)
}

fn parse_parameters(raw: &Value, context: &str) -> Result<Vec<ParameterSpec>> {
    let Some(entries) = raw.as_array() else {
        return Err(Error::Spec(format!(
            "parameters of {context} must be an array"
        )));
    };
    parse_parameters_from_values(entries, context)
}

fn parse_parameters_from_values(entries: &[Value], context: &str) -> Result<Vec<ParameterSpec>> {
    let mut params = Vec::with_capacity(entries.len());
    for entry in entries {
        // External/document $refs are not resolved here (out of scope);
        // skip so the rest of the document stays usable.
        if entry.get("$ref").is_some() {
            tracing::warn!("skipping unresolved $ref parameter in {context}");
            continue;
        }
        let mut param: ParameterSpec = serde_json::from_value(entry.clone())
            .map_err(|e| Error::Spec(format!("malformed parameter in {context}: {e}")))?;
        if param.location == ParamLocation::Path {
            // Path parameters are always required.
            param.required = true;
        }
        params.push(param);
    }
    Ok(params)
}

/// Merge path-level parameters with operation-level ones; an operation
/// parameter overrides a path-level parameter with the same name and
/// location.
fn merge_parameters(
    path_level: Vec<ParameterSpec>,
    operation_level: Vec<ParameterSpec>,
) -> Vec<ParameterSpec> {
    let mut merged = path_level;
    let mut index: HashMap<(ParamLocation, String), usize> = merged
        .iter()
        .enumerate()
        .map(|(i, p)| ((p.location, p.name.clone()), i))
        .collect();

    for param in operation_level {
        let key = (param.location, param.name.clone());
        if let Some(i) = index.get(&key).copied() {
            merged[i] = param;
        } else {
            index.insert(key, merged.len());
            merged.push(param);
        }
    }

    merged
}

fn select_request_body(body: RequestBodyObject) -> RequestBodySpec {
    // Prefer application/json; otherwise take the first declared media type.
    let (media_type, media) = body
        .content
        .get("application/json")
        .map(|m| ("application/json".to_string(), m))
        .or_else(|| body.content.iter().next().map(|(k, v)| (k.clone(), v)))
        .unwrap_or(("application/json".to_string(), &Value::Null));

    RequestBodySpec {
        media_type,
        required: body.required,
        schema: media.get("schema").cloned().unwrap_or(Value::Null),
        description: body.description,
    }
}

fn resolve_http_method(method: &str) -> Result<Method> {
    match method {
        "get" => Ok(Method::GET),
        "post" => Ok(Method::POST),
        "put" => Ok(Method::PUT),
        "delete" => Ok(Method::DELETE),
        "patch" => Ok(Method::PATCH),
        "options" => Ok(Method::OPTIONS),
        "head" => Ok(Method::HEAD),
        other => Err(Error::Spec(format!("unsupported HTTP method: {other}"))),
    }
}

/// Derive a deterministic operation id from method and path.
fn derive_operation_id(method: &str, path: &str) -> String {
    let mut name = format!("{}_{}", method.to_lowercase(), path);

    if let Some(stripped) = name.strip_prefix('/') {
        name = stripped.to_string();
    }

    // Path params {param} become _param.
    let re = Regex::new(r"\{([^}]+)\}").unwrap();
    name = re.replace_all(&name, "_$1").to_string();

    let re = Regex::new(r"[^a-zA-Z0-9]+").unwrap();
    name = re.replace_all(&name, "_").to_string();

    let re = Regex::new(r"_+").unwrap();
    name = re.replace_all(&name, "_").to_string();

    name = name.trim_matches('_').to_string();

    if name.len() > 64 {
        name = name[..64].to_string();
    }

    name
}

fn reserve_unique_id(used: &mut HashSet<String>, base: &str) -> String {
    let base = base.to_string();
    if used.insert(base.clone()) {
        return base;
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
