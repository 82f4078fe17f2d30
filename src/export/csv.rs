//! CSV serialization of schemas and captured answers

use crate::form::FormData;
use crate::schema::{FieldDescriptor, Schema};

/// Column header of a schema export. Every row has all seven cells.
pub const SCHEMA_HEADER: [&str; 7] = [
    "Field Name",
    "Type",
    "Title",
    "Min Length",
    "Max Length",
    "Minimum",
    "Maximum",
];

/// One record per field after the header, joined by `\n` without a trailing
/// newline. Quoted cells may span several physical lines.
pub fn to_csv(schema: &Schema) -> String {
    let mut records = Vec::with_capacity(schema.len() + 1);
    records.push(write_record(SCHEMA_HEADER.iter().copied()));
    for field in &schema.fields {
        let cells = field_cells(field);
        records.push(write_record(cells.iter().map(String::as_str)));
    }
    records.join("\n")
}

/// Header of field titles followed by a single row of captured values
pub fn responses_to_csv(schema: &Schema, data: &FormData) -> String {
    let header = write_record(schema.fields.iter().map(|f| f.title.as_str()));
    let values: Vec<String> = schema
        .fields
        .iter()
        .map(|f| data.get(&f.key).map(|v| v.to_string()).unwrap_or_default())
        .collect();
    let row = write_record(values.iter().map(String::as_str));
    format!("{}\n{}", header, row)
}

fn field_cells(field: &FieldDescriptor) -> [String; 7] {
    let c = &field.constraints;
    [
        field.key.clone(),
        field.field_type.as_str().to_string(),
        field.title.clone(),
        opt_cell(c.min_length),
        opt_cell(c.max_length),
        opt_cell(c.minimum),
        opt_cell(c.maximum),
    ]
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_record<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    cells.map(escape_cell).collect::<Vec<_>>().join(",")
}

/// Quote cells holding a delimiter, quote or line break; double inner quotes
fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
