//! Live form sessions
//!
//! A [`FormRuntime`] binds to one [`Schema`](crate::schema::Schema) and tracks
//! the answers a user has entered so far, validating each against the field's
//! registry rules.

mod runtime;

pub use runtime::FormRuntime;

use serde_json::{Map, Value};
use std::fmt;

/// Raw input captured for a field. Stored verbatim; coercion happens at
/// validation time.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Unset, or text that is only whitespace
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map(FieldValue::Bool).unwrap_or(FieldValue::Empty)
    }
}

/// Why a field value was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Required field has no value
    Required,
    /// Length or numeric range violated
    OutOfRange,
    /// Select value is not one of the options
    NotInOptions,
    /// Value cannot be read as the field's value kind
    TypeMismatch,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            InvalidReason::Required => "This field is required",
            InvalidReason::OutOfRange => "Value is out of range",
            InvalidReason::NotInOptions => "Choose one of the listed options",
            InvalidReason::TypeMismatch => "Value has the wrong format",
        };
        f.write_str(message)
    }
}

/// Outcome of validating one field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(*reason),
        }
    }
}

/// Captured answers in Schema field order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FieldValue)>,
}

impl FormData {
    pub fn new(entries: Vec<(String, FieldValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key to value object; unset values become `null`
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whitespace_counts_as_empty() {
        assert!(FieldValue::Empty.is_empty());
        assert!(FieldValue::from("   ").is_empty());
        assert!(!FieldValue::from(" a ").is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
        assert_eq!(FieldValue::from(None::<bool>), FieldValue::Empty);
    }

    #[test]
    fn test_form_data_json_keeps_order() {
        let data = FormData::new(vec![
            ("name".to_string(), FieldValue::from("Ada")),
            ("agree".to_string(), FieldValue::Bool(true)),
            ("note".to_string(), FieldValue::Empty),
        ]);
        assert_eq!(data.to_json(), json!({"name": "Ada", "agree": true, "note": null}));
        let keys: Vec<&str> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "agree", "note"]);
    }
}
