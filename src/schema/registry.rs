//! Field type registry
//!
//! Single lookup table mapping a [`FieldType`] to the value kind it accepts,
//! the constraints that apply to it and the input control that renders it.
//! The normalizer, runtime and editor all consult this table instead of
//! branching on type tags themselves.

use super::FieldType;

/// Primitive value kind a field accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    /// Tri-state: unset, true or false
    Boolean,
}

/// Constraint kinds a field type may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    Options,
}

/// Input control used to render a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    TextInput,
    EmailInput,
    TextArea,
    PasswordInput,
    NumberInput,
    /// Yes / No radio pair
    YesNo,
    DateInput,
    TimeInput,
    Dropdown,
    TelInput,
    UrlInput,
}

/// Rendering and validation rules for one field type
#[derive(Debug)]
pub struct FieldRenderRules {
    pub field_type: FieldType,
    pub value_kind: ValueKind,
    pub constraints: &'static [Constraint],
    /// Control used when no format refinement matches
    pub control: Control,
    /// Format hint -> control refinements
    pub formats: &'static [(&'static str, Control)],
}

impl FieldRenderRules {
    pub fn applies(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// Resolve the control for an optional format hint
    pub fn control_for(&self, format: Option<&str>) -> Control {
        format
            .and_then(|hint| {
                self.formats
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(hint))
                    .map(|(_, control)| *control)
            })
            .unwrap_or(self.control)
    }
}

const LENGTH: &[Constraint] = &[Constraint::MinLength, Constraint::MaxLength];
const RANGE: &[Constraint] = &[Constraint::Minimum, Constraint::Maximum];
const OPTIONS: &[Constraint] = &[Constraint::Options];
const NONE: &[Constraint] = &[];

static TEXT: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Text,
    value_kind: ValueKind::String,
    constraints: LENGTH,
    control: Control::TextInput,
    formats: &[("email", Control::EmailInput), ("textarea", Control::TextArea)],
};

static PASSWORD: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Password,
    value_kind: ValueKind::String,
    constraints: LENGTH,
    control: Control::PasswordInput,
    formats: &[],
};

static NUMBER: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Number,
    value_kind: ValueKind::Number,
    constraints: RANGE,
    control: Control::NumberInput,
    formats: &[],
};

static INTEGER: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Integer,
    value_kind: ValueKind::Number,
    constraints: RANGE,
    control: Control::NumberInput,
    formats: &[],
};

static BOOLEAN: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Boolean,
    value_kind: ValueKind::Boolean,
    constraints: NONE,
    control: Control::YesNo,
    formats: &[],
};

static DATE: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Date,
    value_kind: ValueKind::String,
    constraints: NONE,
    control: Control::DateInput,
    formats: &[],
};

static TIME: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Time,
    value_kind: ValueKind::String,
    constraints: NONE,
    control: Control::TimeInput,
    formats: &[],
};

static SELECT: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Select,
    value_kind: ValueKind::String,
    constraints: OPTIONS,
    control: Control::Dropdown,
    formats: &[],
};

static PHONE: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Phone,
    value_kind: ValueKind::String,
    constraints: NONE,
    control: Control::TelInput,
    formats: &[],
};

static URL: FieldRenderRules = FieldRenderRules {
    field_type: FieldType::Url,
    value_kind: ValueKind::String,
    constraints: NONE,
    control: Control::UrlInput,
    formats: &[],
};

/// Rules for a field type
pub fn rules_for(field_type: FieldType) -> &'static FieldRenderRules {
    match field_type {
        FieldType::Text => &TEXT,
        FieldType::Password => &PASSWORD,
        FieldType::Number => &NUMBER,
        FieldType::Integer => &INTEGER,
        FieldType::Boolean => &BOOLEAN,
        FieldType::Date => &DATE,
        FieldType::Time => &TIME,
        FieldType::Select => &SELECT,
        FieldType::Phone => &PHONE,
        FieldType::Url => &URL,
    }
}

/// Control for a `(type, format)` pair. Unknown formats fall back to the
/// type's plain control, which for `text` is the no-format text row.
pub fn control_for(field_type: FieldType, format: Option<&str>) -> Control {
    rules_for(field_type).control_for(format)
}
