//! Structural Schema edits
//!
//! Every operation takes a Schema by reference and returns a new one, so a
//! [`FormRuntime`](crate::form::FormRuntime) still holding the previous Schema
//! is never affected by an edit.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Constraints, FieldDescriptor, FieldType, Schema};
use crate::error::EditError;

static NEXT_FIELD_ID: AtomicU64 = AtomicU64::new(1);

/// Key for a new field that is not used anywhere in `schema`
fn next_field_key(schema: &Schema) -> String {
    loop {
        let key = format!("field_{}", NEXT_FIELD_ID.fetch_add(1, Ordering::Relaxed));
        if !schema.contains_key(&key) {
            return key;
        }
    }
}

// ============================================================================
// Drafts and Patches
// ============================================================================

/// A field to add; the editor assigns its key
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDraft {
    pub title: String,
    pub field_type: FieldType,
    pub format: Option<String>,
    pub constraints: Constraints,
    pub required: bool,
}

impl Default for FieldDraft {
    fn default() -> Self {
        Self {
            title: "New field".to_string(),
            field_type: FieldType::Text,
            format: None,
            constraints: Constraints::default(),
            required: false,
        }
    }
}

impl FieldDraft {
    pub fn new(title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            title: title.into(),
            field_type,
            ..Default::default()
        }
    }
}

/// Partial update of a field. `None` leaves the attribute untouched; for
/// optional attributes `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub field_type: Option<FieldType>,
    pub format: Option<Option<String>>,
    pub min_length: Option<Option<u64>>,
    pub max_length: Option<Option<u64>>,
    pub minimum: Option<Option<f64>>,
    pub maximum: Option<Option<f64>>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn format(mut self, format: Option<String>) -> Self {
        self.format = Some(format);
        self
    }

    pub fn min_length(mut self, value: Option<u64>) -> Self {
        self.min_length = Some(value);
        self
    }

    pub fn max_length(mut self, value: Option<u64>) -> Self {
        self.max_length = Some(value);
        self
    }

    pub fn minimum(mut self, value: Option<f64>) -> Self {
        self.minimum = Some(value);
        self
    }

    pub fn maximum(mut self, value: Option<f64>) -> Self {
        self.maximum = Some(value);
        self
    }

    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Append a field under a freshly generated key.
///
/// An empty options list is allowed on a select while editing; the normalizer
/// degrades it to text if the Schema is normalized again.
pub fn add_field(schema: &Schema, draft: FieldDraft) -> Schema {
    let key = next_field_key(schema);
    let title = non_empty(draft.title).unwrap_or_else(|| key.clone());
    let mut constraints = draft.constraints;
    constraints.options = clean_options(constraints.options);

    let mut next = schema.clone();
    if draft.required {
        next.required.insert(key.clone());
    }
    next.fields.push(FieldDescriptor {
        key,
        field_type: draft.field_type,
        title,
        format: draft.field_type.format_hint(draft.format.as_deref()),
        constraints: constraints.sanitized_for(draft.field_type),
    });
    next
}

/// Remove a field. Unknown keys leave the Schema unchanged.
pub fn remove_field(schema: &Schema, key: &str) -> Schema {
    let mut next = schema.clone();
    next.fields.retain(|f| f.key != key);
    next.required.remove(key);
    next
}

/// Apply a partial update to one field. Unknown keys leave the Schema unchanged.
///
/// Switching away from `select` drops its options; switching to `select`
/// starts from the patch's options, or an empty list.
pub fn update_field(schema: &Schema, key: &str, patch: FieldPatch) -> Schema {
    let Some(idx) = schema.position(key) else {
        tracing::debug!(key, "Ignoring update for unknown field");
        return schema.clone();
    };

    let mut next = schema.clone();
    let field = &mut next.fields[idx];

    if let Some(title) = patch.title {
        field.title = non_empty(title).unwrap_or_else(|| field.key.clone());
    }
    if let Some(field_type) = patch.field_type {
        field.field_type = field_type;
    }
    if let Some(format) = patch.format {
        field.format = format;
    }
    field.format = field.field_type.format_hint(field.format.as_deref());

    let c = &mut field.constraints;
    if let Some(v) = patch.min_length {
        c.min_length = v;
    }
    if let Some(v) = patch.max_length {
        c.max_length = v;
    }
    if let Some(v) = patch.minimum {
        c.minimum = v.filter(|n| n.is_finite());
    }
    if let Some(v) = patch.maximum {
        c.maximum = v.filter(|n| n.is_finite());
    }
    if let Some(options) = patch.options {
        c.options = clean_options(options);
    }
    field.constraints = mem::take(&mut field.constraints).sanitized_for(field.field_type);

    match patch.required {
        Some(true) => {
            next.required.insert(key.to_string());
        }
        Some(false) => {
            next.required.remove(key);
        }
        None => {}
    }

    next
}

/// Change a field's key, keeping its position and required membership.
pub fn rename_key(schema: &Schema, old_key: &str, new_key: &str) -> Result<Schema, EditError> {
    if new_key.is_empty() {
        return Err(EditError::EmptyKey);
    }
    let Some(idx) = schema.position(old_key) else {
        return Ok(schema.clone());
    };
    if old_key == new_key {
        return Ok(schema.clone());
    }
    if schema.contains_key(new_key) {
        return Err(EditError::DuplicateKey(new_key.to_string()));
    }

    let mut next = schema.clone();
    next.fields[idx].key = new_key.to_string();
    if next.required.remove(old_key) {
        next.required.insert(new_key.to_string());
    }
    Ok(next)
}

/// Replace the form title; blank titles clear it.
pub fn set_title(schema: &Schema, title: &str) -> Schema {
    let mut next = schema.clone();
    next.title = non_empty(title.to_string());
    next
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn clean_options(options: Vec<String>) -> Vec<String> {
    options.into_iter().filter_map(non_empty).collect()
}

// ============================================================================
// Tests
// ============================================================================
