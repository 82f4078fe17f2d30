//! Schema normalization
//!
//! Turns the raw text returned by a completion endpoint into a canonical
//! [`Schema`]. The generator is not bound to any contract, so every unknown
//! shape either degrades to a safe default or fails explicitly.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::{Constraints, FieldDescriptor, FieldType, Schema};
use crate::error::SchemaError;

// ============================================================================
// Entry Point
// ============================================================================

/// Normalize raw generated text into a canonical Schema.
pub fn normalize(raw_text: &str) -> Result<Schema, SchemaError> {
    let payload = strip_code_fence(raw_text.trim());
    let value: Value = serde_json::from_str(payload)?;
    normalize_value(&value)
}

/// Normalize an already-parsed payload.
pub fn normalize_value(value: &Value) -> Result<Schema, SchemaError> {
    let root = value.as_object().ok_or(SchemaError::MissingProperties)?;
    let properties = root
        .get("properties")
        .or_else(|| root.get("fields"))
        .and_then(|v| v.as_object())
        .ok_or(SchemaError::MissingProperties)?;

    let mut fields = Vec::with_capacity(properties.len());
    let mut flagged_required = Vec::new();

    for (key, raw_field) in properties {
        if key.is_empty() {
            tracing::debug!("Skipping field with empty key");
            continue;
        }
        if raw_field.get("required").and_then(|v| v.as_bool()) == Some(true) {
            flagged_required.push(key.clone());
        }
        fields.push(normalize_field(key, raw_field));
    }

    let mut schema = Schema {
        title: root
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from),
        fields,
        required: BTreeSet::new(),
    };

    let listed: Vec<String> = root
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    for key in listed.into_iter().chain(flagged_required) {
        if schema.contains_key(&key) {
            schema.required.insert(key);
        } else {
            tracing::debug!(key = %key, "Dropping required key with no matching field");
        }
    }

    Ok(schema)
}

// ============================================================================
// Field Normalization
// ============================================================================

fn normalize_field(key: &str, raw: &Value) -> FieldDescriptor {
    let obj = match raw {
        Value::Object(obj) => obj,
        // A bare tag such as `"email": "text"`
        Value::String(tag) => {
            let field_type = resolve_type(Some(tag.as_str()), None, false);
            return FieldDescriptor::new(key, field_type);
        }
        _ => {
            tracing::debug!(key, "Field descriptor is not an object, degrading to text");
            return FieldDescriptor::new(key, FieldType::Text);
        }
    };

    let format = obj
        .get("format")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from);
    let options = extract_options(obj);
    let mut field_type = resolve_type(
        obj.get("type").and_then(|v| v.as_str()),
        format.as_deref(),
        !options.is_empty(),
    );

    if field_type == FieldType::Select && options.is_empty() {
        tracing::debug!(key, "Select field without options, degrading to text");
        field_type = FieldType::Text;
    }

    let constraints = Constraints {
        min_length: obj.get("minLength").and_then(coerce_length),
        max_length: obj.get("maxLength").and_then(coerce_length),
        minimum: obj.get("minimum").and_then(coerce_number),
        maximum: obj.get("maximum").and_then(coerce_number),
        options,
    }
    .sanitized_for(field_type);

    // A format that was promoted into the type carries no further meaning
    let format = field_type.format_hint(format.as_deref());

    let title = obj
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(key);

    FieldDescriptor {
        key: key.to_string(),
        field_type,
        title: title.to_string(),
        format,
        constraints,
    }
}

/// Resolve the declared type tag into the canonical enum.
///
/// Accepts the form-builder tags plus the JSON-Schema spellings models tend to
/// produce. Anything unrecognized degrades to `text`.
fn resolve_type(tag: Option<&str>, format: Option<&str>, has_options: bool) -> FieldType {
    let tag = tag.map(|t| t.trim().to_ascii_lowercase());
    let resolved = match tag.as_deref() {
        Some("string") | None => {
            let promoted = format
                .map(str::to_ascii_lowercase)
                .and_then(|f| FieldType::from_tag(&f))
                .filter(|t| PROMOTABLE_FORMATS.contains(t));
            match promoted {
                Some(t) => Some(t),
                None if has_options => Some(FieldType::Select),
                None => None,
            }
        }
        Some("tel") => Some(FieldType::Phone),
        Some("uri") => Some(FieldType::Url),
        Some("enum") | Some("dropdown") => Some(FieldType::Select),
        Some("checkbox") => Some(FieldType::Boolean),
        Some(other) => FieldType::from_tag(other),
    };

    resolved.unwrap_or_else(|| {
        if let Some(tag) = &tag {
            if tag != "string" {
                tracing::debug!(tag = %tag, "Unknown field type, degrading to text");
            }
        }
        FieldType::Text
    })
}

/// Formats that name a form-builder type when attached to a `string` field
const PROMOTABLE_FORMATS: [FieldType; 6] = [
    FieldType::Date,
    FieldType::Time,
    FieldType::Password,
    FieldType::Phone,
    FieldType::Url,
    FieldType::Select,
];

/// Options come from `options`, or from `enum` when `options` yields nothing usable
fn extract_options(obj: &Map<String, Value>) -> Vec<String> {
    ["options", "enum"]
        .iter()
        .map(|name| option_list(obj.get(*name)))
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

fn option_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Coercion
// ============================================================================

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn coerce_length(value: &Value) -> Option<u64> {
    coerce_number(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as u64)
}

/// Strip a surrounding markdown code fence such as ```` ```json ... ``` ````.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

// ============================================================================
// Tests
// ============================================================================
