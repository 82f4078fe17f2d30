use formwright::export::DEFAULT_FALLBACK_FILENAME;
use formwright::{
    add_field, csv_download, normalize, rename_key, responses_to_csv, update_field, FieldDraft,
    FieldPatch, FieldType, FieldValue, FormRuntime, InvalidReason, SchemaError,
};
use std::sync::Arc;

const GENERATED: &str = r#"```json
{
  "title": "Event RSVP",
  "properties": {
    "name": { "type": "text", "title": "Your name", "minLength": "2" },
    "guests": { "type": "number", "title": "Guests", "minimum": 0, "maximum": 5 },
    "meal": { "type": "select", "title": "Meal", "enum": ["Vegan", "Fish", "Beef"] },
    "attending": { "type": "boolean", "title": "Attending?" },
    "arrival": { "type": "string", "format": "time", "title": "Arrival" },
    "dietary": { "type": "select", "title": "Dietary notes" }
  },
  "required": ["name", "attending", "ghost"]
}
```"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_generated_form_end_to_end() {
    init_tracing();
    let schema = normalize(GENERATED).unwrap();

    let keys: Vec<&str> = schema.keys().collect();
    assert_eq!(keys, vec!["name", "guests", "meal", "attending", "arrival", "dietary"]);
    assert_eq!(schema.field("arrival").unwrap().field_type, FieldType::Time);
    // Select without options degrades to text
    assert_eq!(schema.field("dietary").unwrap().field_type, FieldType::Text);
    assert_eq!(schema.field("name").unwrap().constraints.min_length, Some(2));
    assert!(!schema.is_required("ghost"));

    let mut form = FormRuntime::new(schema.clone()).unwrap();
    form.set_value("name", "Jo").unwrap();
    assert!(!form.is_submittable());
    form.set_value("attending", true).unwrap();
    assert!(form.is_submittable());

    form.set_value("guests", "9").unwrap();
    assert_eq!(
        form.validate("guests").unwrap().reason(),
        Some(InvalidReason::OutOfRange)
    );
    assert!(!form.is_submittable());
    form.set_value("guests", "2").unwrap();
    form.set_value("meal", "Fish").unwrap();
    assert!(form.is_submittable());

    let answers = responses_to_csv(&schema, &form.form_data());
    assert_eq!(
        answers,
        "Your name,Guests,Meal,Attending?,Arrival,Dietary notes\nJo,2,Fish,true,,"
    );

    let download = csv_download(&schema, DEFAULT_FALLBACK_FILENAME);
    assert_eq!(download.filename, "event-rsvp.csv");
    assert_eq!(download.body.lines().count(), 1 + schema.len());
}

#[test]
fn test_editing_while_a_session_is_open() {
    let schema = Arc::new(normalize(GENERATED).unwrap());
    let mut form = FormRuntime::new(Arc::clone(&schema)).unwrap();
    form.set_value("name", "Jo").unwrap();

    let edited = add_field(&schema, FieldDraft::new("Phone", FieldType::Phone));
    let edited = update_field(&edited, "meal", FieldPatch::new().required(true));
    let edited = rename_key(&edited, "name", "full_name").unwrap();

    // The running session still validates against its own revision
    assert!(form.schema().contains_key("name"));
    assert_eq!(schema.len(), 6);

    form.rebind(edited.clone()).unwrap();
    assert_eq!(form.value("name"), None);
    assert_eq!(form.value("full_name"), None);
    form.set_value("full_name", "Jo").unwrap();
    form.set_value("attending", FieldValue::Bool(false)).unwrap();
    assert!(!form.is_submittable());
    form.set_value("meal", "Vegan").unwrap();
    assert!(form.is_submittable());

    let round_trip = normalize(&edited.to_text()).unwrap();
    assert_eq!(round_trip, edited);
}

#[test]
fn test_unusable_output_is_rejected() {
    assert!(matches!(normalize("not json"), Err(SchemaError::MalformedJson(_))));
    assert_eq!(
        normalize(r#"{"title":"Nothing here"}"#),
        Err(SchemaError::MissingProperties)
    );
}
