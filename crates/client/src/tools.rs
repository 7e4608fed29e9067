//! AI tool definitions derived from indexed operations.
//!
//! One [`ToolDefinition`] per operation, in document order: the request
//! body schema (with `#/components/schemas` references inlined) plus one
//! property per declared parameter. Derivation is pure; no network.

use crate::index::{OperationDescriptor, OperationIndex};
use crate::spec::SpecDocument;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};

/// A function-calling tool description for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Operation id.
    pub name: String,
    /// Operation `summary`, falling back to `description`.
    pub description: String,
    /// JSON-schema-shaped argument object: a `body` property for the
    /// request body plus one property per declared parameter.
    pub parameters: Value,
}

impl ToolDefinition {
    /// The `{"type": "function", "function": {...}}` wrapper expected by
    /// OpenAI-style function-calling APIs.
    #[must_use]
    pub fn openai_format(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Derive tool definitions for every indexed operation, in document order.
pub(crate) fn build_tools(index: &OperationIndex, document: &SpecDocument) -> Vec<ToolDefinition> {
    let schemas = document.component_schemas();
    index
        .descriptors()
        .map(|op| tool_for_operation(op, &schemas))
        .collect()
}

fn tool_for_operation(
    operation: &OperationDescriptor,
    schemas: &HashMap<String, &Value>,
) -> ToolDefinition {
    let mut required: Vec<Value> = Vec::new();
    let mut properties = Map::new();
    let mut body_description = String::new();

    let body_schema = match &operation.request_body {
        Some(body) => {
            if body.required {
                required.push(Value::String("body".to_string()));
            }
            if let Some(desc) = &body.description {
                body_description = desc.clone();
            }
            let mut seen = HashSet::new();
            resolve_schema_refs(&body.schema, schemas, &mut seen)
        }
        None => json!({}),
    };
    properties.insert("body".to_string(), body_schema);

    for param in &operation.parameters {
        if param.required {
            required.push(Value::String(param.name.clone()));
        }

        let mut item = Map::new();
        let type_hint = param
            .schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string");
        item.insert("type".to_string(), Value::String(type_hint.to_string()));
        item.insert(
            "description".to_string(),
            Value::String(param.description.clone().unwrap_or_default()),
        );
        for key in ["format", "enum", "example"] {
            if let Some(hint) = param.schema.get(key) {
                if !hint.is_null() {
                    item.insert(key.to_string(), hint.clone());
                }
            }
        }
        properties.insert(param.name.clone(), Value::Object(item));
    }

    let parameters = json!({
        "type": "object",
        "required": required,
        "description": body_description,
        "properties": properties,
    });

    ToolDefinition {
        name: operation.id.clone(),
        description: operation
            .summary
            .clone()
            .or_else(|| operation.description.clone())
            .unwrap_or_default(),
        parameters,
    }
}

/// Inline `#/components/schemas/...` references, recursing into object
/// properties and array items. `seen` breaks reference cycles: a schema
/// already on the resolution path is replaced with an empty schema.
fn resolve_schema_refs(
    schema: &Value,
    schemas: &HashMap<String, &Value>,
    seen: &mut HashSet<String>,
) -> Value {
    if schema.is_null() {
        return json!({});
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if !seen.insert(reference.to_string()) {
            return json!({});
        }
        let resolved = match schemas.get(reference) {
            Some(target) => resolve_schema_refs(target, schemas, seen),
            None => json!({}),
        };
        seen.remove(reference);
        return resolved;
    }

    match schema.get("type").and_then(Value::as_str) {
        Some("object") => {
            let mut out = schema.clone();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                let resolved: Map<String, Value> = props
                    .iter()
                    .map(|(name, prop)| (name.clone(), resolve_schema_refs(prop, schemas, seen)))
                    .collect();
                out["properties"] = Value::Object(resolved);
            }
            out
        }
        Some("array") => {
            let mut out = schema.clone();
            let items = schema.get("items").unwrap_or(&Value::Null);
            out["items"] = resolve_schema_refs(items, schemas, seen);
            out
        }
        _ => schema.clone(),
    }
}
