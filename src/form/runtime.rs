use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{FieldValue, FormData, InvalidReason, ValidationResult};
use crate::error::{FormError, SchemaError};
use crate::schema::{Constraints, FieldDescriptor, FieldType, Schema, ValueKind};

/// Answers for one form session, bound to a single Schema revision.
///
/// The runtime shares its Schema through an `Arc` and never mutates it; edits
/// produce a new Schema which can be attached with [`FormRuntime::rebind`].
#[derive(Debug, Clone)]
pub struct FormRuntime {
    schema: Arc<Schema>,
    values: HashMap<String, FieldValue>,
    touched: HashSet<String>,
}

impl FormRuntime {
    /// Bind to a Schema, refusing one that breaks its invariants
    pub fn new(schema: impl Into<Arc<Schema>>) -> Result<Self, SchemaError> {
        let schema = schema.into();
        check_schema(&schema)?;
        Ok(Self {
            schema,
            values: HashMap::new(),
            touched: HashSet::new(),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Store a value verbatim and mark the field touched
    pub fn set_value(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.descriptor(key)?;
        self.values.insert(key.to_string(), value.into());
        self.touched.insert(key.to_string());
        Ok(())
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.touched.contains(key)
    }

    /// Validate the current value of a field against its type rules
    pub fn validate(&self, key: &str) -> Result<ValidationResult, FormError> {
        let field = self.descriptor(key)?;
        let value = self.values.get(key).unwrap_or(&FieldValue::Empty);
        Ok(validate_value(field, value, self.schema.is_required(key)))
    }

    /// Every required field is touched and valid, and no touched field is invalid
    pub fn is_submittable(&self) -> bool {
        let required_ok = self
            .schema
            .required
            .iter()
            .all(|key| self.is_touched(key) && self.is_valid(key));
        required_ok && self.touched.iter().all(|key| self.is_valid(key))
    }

    /// Validation failures for touched fields, in field order
    pub fn errors(&self) -> Vec<(&str, InvalidReason)> {
        self.schema
            .fields
            .iter()
            .filter(|f| self.is_touched(&f.key))
            .filter_map(|f| {
                let value = self.values.get(&f.key).unwrap_or(&FieldValue::Empty);
                validate_value(f, value, self.schema.is_required(&f.key))
                    .reason()
                    .map(|reason| (f.key.as_str(), reason))
            })
            .collect()
    }

    /// Captured values for every field, in field order
    pub fn form_data(&self) -> FormData {
        let entries = self
            .schema
            .fields
            .iter()
            .map(|f| {
                let value = self.values.get(&f.key).cloned().unwrap_or_default();
                (f.key.clone(), value)
            })
            .collect();
        FormData::new(entries)
    }

    /// Clear all answers
    pub fn reset(&mut self) {
        self.values.clear();
        self.touched.clear();
    }

    /// Attach a revised Schema, keeping answers for keys that still exist
    pub fn rebind(&mut self, schema: impl Into<Arc<Schema>>) -> Result<(), SchemaError> {
        let schema = schema.into();
        check_schema(&schema)?;
        self.values.retain(|key, _| schema.contains_key(key));
        self.touched.retain(|key| schema.contains_key(key));
        self.schema = schema;
        Ok(())
    }

    fn descriptor(&self, key: &str) -> Result<&FieldDescriptor, FormError> {
        self.schema
            .field(key)
            .ok_or_else(|| FormError::UnknownFieldKey(key.to_string()))
    }

    fn is_valid(&self, key: &str) -> bool {
        self.validate(key).map(|r| r.is_valid()).unwrap_or(false)
    }
}

fn check_schema(schema: &Schema) -> Result<(), SchemaError> {
    schema.check_invariants().map_err(|e| {
        tracing::error!(error = %e, "Refusing to bind form runtime to inconsistent schema");
        e
    })
}

// ============================================================================
// Validation
// ============================================================================

fn validate_value(field: &FieldDescriptor, value: &FieldValue, required: bool) -> ValidationResult {
    if value.is_empty() {
        return if required {
            ValidationResult::Invalid(InvalidReason::Required)
        } else {
            ValidationResult::Valid
        };
    }

    let outcome = match field.rules().value_kind {
        ValueKind::String => match value {
            FieldValue::Text(text) => check_string(field, text),
            _ => Err(InvalidReason::TypeMismatch),
        },
        ValueKind::Number => match value {
            FieldValue::Text(text) => check_number(field, text),
            _ => Err(InvalidReason::TypeMismatch),
        },
        ValueKind::Boolean => match value {
            FieldValue::Bool(_) => Ok(()),
            FieldValue::Text(text) => parse_bool(text).map(|_| ()),
            FieldValue::Empty => Ok(()),
        },
    };

    match outcome {
        Ok(()) => ValidationResult::Valid,
        Err(reason) => ValidationResult::Invalid(reason),
    }
}

fn check_string(field: &FieldDescriptor, text: &str) -> Result<(), InvalidReason> {
    match field.field_type {
        FieldType::Text | FieldType::Password => check_length(&field.constraints, text),
        FieldType::Select => {
            if field.constraints.options.iter().any(|o| o == text) {
                Ok(())
            } else {
                Err(InvalidReason::NotInOptions)
            }
        }
        FieldType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| InvalidReason::TypeMismatch),
        FieldType::Time => parse_time(text.trim()),
        _ => Ok(()),
    }
}

fn check_length(constraints: &Constraints, text: &str) -> Result<(), InvalidReason> {
    let len = text.chars().count() as u64;
    if constraints.min_length.is_some_and(|min| len < min)
        || constraints.max_length.is_some_and(|max| len > max)
    {
        return Err(InvalidReason::OutOfRange);
    }
    Ok(())
}

fn check_number(field: &FieldDescriptor, text: &str) -> Result<(), InvalidReason> {
    let n: f64 = text
        .trim()
        .parse()
        .map_err(|_| InvalidReason::TypeMismatch)?;
    if !n.is_finite() || (field.field_type == FieldType::Integer && n.fract() != 0.0) {
        return Err(InvalidReason::TypeMismatch);
    }
    let c = &field.constraints;
    if c.minimum.is_some_and(|min| n < min) || c.maximum.is_some_and(|max| n > max) {
        return Err(InvalidReason::OutOfRange);
    }
    Ok(())
}

fn parse_time(text: &str) -> Result<(), InvalidReason> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map(|_| ())
        .map_err(|_| InvalidReason::TypeMismatch)
}

fn parse_bool(text: &str) -> Result<bool, InvalidReason> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(InvalidReason::TypeMismatch),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{normalize, remove_field, update_field, FieldPatch};

    fn runtime(raw: &str) -> FormRuntime {
        FormRuntime::new(normalize(raw).unwrap()).unwrap()
    }

    fn signup() -> FormRuntime {
        runtime(
            r#"{"properties":{
                "name":{"type":"text","minLength":2,"maxLength":5},
                "age":{"type":"integer","minimum":18,"maximum":99},
                "plan":{"type":"select","options":["free","pro"]},
                "agree":{"type":"boolean"},
                "born":{"type":"date"},
                "at":{"type":"time"},
                "note":{"type":"text"}
            },"required":["name","plan"]}"#,
        )
    }

    fn reason(rt: &FormRuntime, key: &str) -> Option<InvalidReason> {
        rt.validate(key).unwrap().reason()
    }

    #[test]
    fn test_scenario_email_required() {
        let mut rt = runtime(
            r#"{"properties":{"email":{"type":"string","format":"email"}},"required":["email"]}"#,
        );
        assert!(!rt.is_submittable());
        rt.set_value("email", "a@b.com").unwrap();
        assert!(rt.is_submittable());
    }

    #[test]
    fn test_unknown_key() {
        let mut rt = signup();
        assert_eq!(
            rt.set_value("ghost", "x"),
            Err(FormError::UnknownFieldKey("ghost".to_string()))
        );
        assert!(rt.validate("ghost").is_err());
    }

    #[test]
    fn test_required_and_empty() {
        let mut rt = signup();
        assert_eq!(reason(&rt, "name"), Some(InvalidReason::Required));
        assert_eq!(reason(&rt, "note"), None);
        rt.set_value("name", "   ").unwrap();
        assert_eq!(reason(&rt, "name"), Some(InvalidReason::Required));
    }

    #[test]
    fn test_length_and_range() {
        let mut rt = signup();
        rt.set_value("name", "A").unwrap();
        assert_eq!(reason(&rt, "name"), Some(InvalidReason::OutOfRange));
        rt.set_value("name", "Ada").unwrap();
        assert_eq!(reason(&rt, "name"), None);
        rt.set_value("age", "17").unwrap();
        assert_eq!(reason(&rt, "age"), Some(InvalidReason::OutOfRange));
        rt.set_value("age", "30").unwrap();
        assert_eq!(reason(&rt, "age"), None);
    }

    #[test]
    fn test_type_mismatches() {
        let mut rt = signup();
        rt.set_value("age", "thirty").unwrap();
        assert_eq!(reason(&rt, "age"), Some(InvalidReason::TypeMismatch));
        rt.set_value("age", "30.5").unwrap();
        assert_eq!(reason(&rt, "age"), Some(InvalidReason::TypeMismatch));
        rt.set_value("name", true).unwrap();
        assert_eq!(reason(&rt, "name"), Some(InvalidReason::TypeMismatch));
        rt.set_value("agree", "maybe").unwrap();
        assert_eq!(reason(&rt, "agree"), Some(InvalidReason::TypeMismatch));
        rt.set_value("agree", "TRUE").unwrap();
        assert_eq!(reason(&rt, "agree"), None);
    }

    #[test]
    fn test_select_options() {
        let mut rt = signup();
        rt.set_value("plan", "enterprise").unwrap();
        assert_eq!(reason(&rt, "plan"), Some(InvalidReason::NotInOptions));
        rt.set_value("plan", "pro").unwrap();
        assert_eq!(reason(&rt, "plan"), None);
    }

    #[test]
    fn test_date_and_time() {
        let mut rt = signup();
        rt.set_value("born", "2024-02-30").unwrap();
        assert_eq!(reason(&rt, "born"), Some(InvalidReason::TypeMismatch));
        rt.set_value("born", "2024-02-29").unwrap();
        assert_eq!(reason(&rt, "born"), None);
        rt.set_value("at", "25:00").unwrap();
        assert_eq!(reason(&rt, "at"), Some(InvalidReason::TypeMismatch));
        rt.set_value("at", "09:30").unwrap();
        assert_eq!(reason(&rt, "at"), None);
        rt.set_value("at", "09:30:15").unwrap();
        assert_eq!(reason(&rt, "at"), None);
    }

    #[test]
    fn test_submittability_monotonicity() {
        let mut rt = signup();
        rt.set_value("name", "Ada").unwrap();
        rt.set_value("plan", "free").unwrap();
        assert!(rt.is_submittable());

        // Valid optional answer keeps it submittable
        rt.set_value("agree", false).unwrap();
        assert!(rt.is_submittable());

        // Invalid touched optional answer blocks it
        rt.set_value("age", "3").unwrap();
        assert!(!rt.is_submittable());
        rt.set_value("age", FieldValue::Empty).unwrap();
        assert!(rt.is_submittable());

        // Clearing a required answer always blocks it
        rt.set_value("plan", FieldValue::Empty).unwrap();
        assert!(!rt.is_submittable());
    }

    #[test]
    fn test_errors_only_for_touched_fields() {
        let mut rt = signup();
        assert!(rt.errors().is_empty());
        rt.set_value("plan", "gold").unwrap();
        rt.set_value("name", "").unwrap();
        assert_eq!(
            rt.errors(),
            vec![("name", InvalidReason::Required), ("plan", InvalidReason::NotInOptions)]
        );
    }

    #[test]
    fn test_form_data_and_reset() {
        let mut rt = signup();
        rt.set_value("name", "Ada").unwrap();
        rt.set_value("agree", true).unwrap();
        let data = rt.form_data();
        assert_eq!(data.len(), 7);
        assert_eq!(data.get("name"), Some(&FieldValue::from("Ada")));
        assert_eq!(data.get("age"), Some(&FieldValue::Empty));

        rt.reset();
        assert!(!rt.is_touched("name"));
        assert_eq!(rt.value("name"), None);
    }

    #[test]
    fn test_construction_rejects_inconsistent_schema() {
        let mut schema = normalize(r#"{"properties":{"a":{"type":"text"}}}"#).unwrap();
        schema.required.insert("b".to_string());
        assert!(matches!(
            FormRuntime::new(schema),
            Err(SchemaError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_rebind_keeps_surviving_answers() {
        let mut rt = signup();
        rt.set_value("name", "Ada").unwrap();
        rt.set_value("note", "hi").unwrap();
        let held = Arc::clone(rt.schema());

        let revised = remove_field(&held, "note");
        let revised = update_field(&revised, "age", FieldPatch::new().required(true));
        rt.rebind(revised).unwrap();

        assert_eq!(rt.value("name"), Some(&FieldValue::from("Ada")));
        assert_eq!(rt.value("note"), None);
        assert!(rt.set_value("note", "x").is_err());
        assert_eq!(reason(&rt, "age"), Some(InvalidReason::Required));
        // The previously held revision is unchanged
        assert!(held.contains_key("note"));
    }
}
