//! Canonical form schema
//!
//! A [`Schema`] is the unit exchanged between every part of the engine: the
//! normalizer produces it, the runtime validates against it, the exporter
//! serializes it and the editor derives revised copies of it.

pub mod editor;
pub mod normalizer;
pub mod registry;

pub use editor::{add_field, remove_field, rename_key, set_title, update_field, FieldDraft, FieldPatch};
pub use normalizer::normalize;
pub use registry::{control_for, rules_for, Constraint, Control, FieldRenderRules, ValueKind};

use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::SchemaError;

// ============================================================================
// Field Type
// ============================================================================

/// Input type of a field, using the form-builder tag set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Number,
    Integer,
    Boolean,
    Date,
    Password,
    Select,
    Phone,
    Url,
    Time,
}

impl FieldType {
    /// Every type, in the order the editor offers them
    pub const ALL: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Password,
        FieldType::Select,
        FieldType::Phone,
        FieldType::Url,
        FieldType::Time,
    ];

    /// Tag used in the canonical text form and in CSV exports
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Password => "password",
            FieldType::Select => "select",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Time => "time",
        }
    }

    /// Parse an exact tag. Aliases are handled by the normalizer, not here.
    pub fn from_tag(tag: &str) -> Option<FieldType> {
        FieldType::ALL.iter().copied().find(|t| t.as_str() == tag)
    }

    /// The format hint a field of this type keeps: trimmed, and dropped when
    /// blank or when it only repeats the type tag.
    pub fn format_hint(self, format: Option<&str>) -> Option<String> {
        format
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .filter(|f| FieldType::from_tag(&f.to_ascii_lowercase()) != Some(self))
            .map(String::from)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Largest `minLength`/`maxLength` a field can carry
pub const MAX_LENGTH_BOUND: u64 = u32::MAX as u64;

/// Type-specific constraints. `None` / empty means unconstrained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    /// Minimum string length (text, password)
    pub min_length: Option<u64>,
    /// Maximum string length (text, password)
    pub max_length: Option<u64>,
    /// Minimum value (number, integer)
    pub minimum: Option<f64>,
    /// Maximum value (number, integer)
    pub maximum: Option<f64>,
    /// Allowed values (select)
    pub options: Vec<String>,
}

impl Constraints {
    /// Keep only the constraints the registry allows for `field_type`, drop
    /// length bounds above [`MAX_LENGTH_BOUND`], then drop any upper bound
    /// that sits below its lower bound.
    pub fn sanitized_for(mut self, field_type: FieldType) -> Self {
        let rules = rules_for(field_type);
        if !rules.applies(Constraint::MinLength) {
            self.min_length = None;
        }
        if !rules.applies(Constraint::MaxLength) {
            self.max_length = None;
        }
        if !rules.applies(Constraint::Minimum) {
            self.minimum = None;
        }
        if !rules.applies(Constraint::Maximum) {
            self.maximum = None;
        }
        if !rules.applies(Constraint::Options) {
            self.options.clear();
        }
        self.min_length = self.min_length.filter(|n| *n <= MAX_LENGTH_BOUND);
        self.max_length = self.max_length.filter(|n| *n <= MAX_LENGTH_BOUND);
        self.enforce_order();
        self
    }

    fn enforce_order(&mut self) {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if max < min {
                tracing::debug!(min, max, "Dropping maxLength below minLength");
                self.max_length = None;
            }
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if max < min {
                tracing::debug!(min, max, "Dropping maximum below minimum");
                self.maximum = None;
            }
        }
    }

    fn ordering_violation(&self) -> Option<&'static str> {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) if max < min => return Some("maxLength below minLength"),
            _ => {}
        }
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if max < min => Some("maximum below minimum"),
            _ => None,
        }
    }
}

// ============================================================================
// Field Descriptor
// ============================================================================

/// One field of a form
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Opaque key, unique within its Schema
    pub key: String,
    pub field_type: FieldType,
    /// Human-readable label
    pub title: String,
    /// Advisory refinement such as `email` or `textarea`
    pub format: Option<String>,
    pub constraints: Constraints,
}

impl FieldDescriptor {
    /// Unconstrained field labelled with its key
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            field_type,
            format: None,
            constraints: Constraints::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Rendering and validation rules for this field's type
    pub fn rules(&self) -> &'static FieldRenderRules {
        rules_for(self.field_type)
    }

    /// Input control after applying the format refinement
    pub fn control(&self) -> Control {
        control_for(self.field_type, self.format.as_deref())
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(self.field_type.as_str()));
        obj.insert("title".to_string(), json!(self.title));
        if let Some(format) = &self.format {
            obj.insert("format".to_string(), json!(format));
        }
        let c = &self.constraints;
        if let Some(v) = c.min_length {
            obj.insert("minLength".to_string(), json!(v));
        }
        if let Some(v) = c.max_length {
            obj.insert("maxLength".to_string(), json!(v));
        }
        if let Some(v) = c.minimum {
            obj.insert("minimum".to_string(), json!(v));
        }
        if let Some(v) = c.maximum {
            obj.insert("maximum".to_string(), json!(v));
        }
        if self.field_type == FieldType::Select {
            obj.insert("options".to_string(), json!(c.options));
        }
        Value::Object(obj)
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Ordered, canonical description of a form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    /// Display title of the form
    pub title: Option<String>,
    /// Fields in render order
    pub fields: Vec<FieldDescriptor>,
    /// Keys of required fields, always a subset of the field keys
    pub required: BTreeSet<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.contains(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the structural invariants every consumer relies on.
    ///
    /// Empty select options are tolerated: the editor produces them transiently.
    pub fn check_invariants(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.key.is_empty() {
                return Err(SchemaError::InvariantViolation("empty field key".to_string()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::InvariantViolation(format!(
                    "duplicate field key '{}'",
                    field.key
                )));
            }
            if let Some(problem) = field.constraints.ordering_violation() {
                return Err(SchemaError::InvariantViolation(format!(
                    "field '{}': {}",
                    field.key, problem
                )));
            }
        }

        if let Some(missing) = self.required.iter().find(|k| !seen.contains(k.as_str())) {
            return Err(SchemaError::InvariantViolation(format!(
                "required key '{}' has no field",
                missing
            )));
        }

        Ok(())
    }

    /// Canonical JSON payload. Normalizing it yields an equal Schema.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(title) = &self.title {
            obj.insert("title".to_string(), json!(title));
        }
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.key.clone(), f.to_json()))
            .collect();
        obj.insert("properties".to_string(), Value::Object(properties));
        // Field order keeps the output stable for diffs
        let required: Vec<&str> = self.keys().filter(|k| self.is_required(k)).collect();
        obj.insert("required".to_string(), json!(required));
        Value::Object(obj)
    }

    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
