//! Wizard requests, templates and prompt text

use serde::{Deserialize, Serialize};

use super::error::RequestError;

pub const MIN_FIELDS: u32 = 1;
pub const MAX_FIELDS: u32 = 20;
pub const MIN_DESCRIPTION_CHARS: usize = 15;

/// Form types offered by the wizard before falling back to a custom type
pub const PREDEFINED_FORM_TYPES: &[&str] = &[
    "Registration",
    "Feedback",
    "Survey",
    "Application",
    "Contact Us",
    "Order Form",
    "Subscription",
    "Login",
    "Job Application",
    "Event RSVP",
    "Product Review",
    "Support Ticket",
    "Newsletter Signup",
    "Poll",
    "Appointment Booking",
    "User Profile",
    "Contest Entry",
];

pub const SYSTEM_PROMPT: &str = "You are an assistant that generates user-friendly JSON schemas for forms. \
You should only create fields which have the type of text, number, boolean, date, password, select, phone, url, and time. \
The schema should contain the title, a \"properties\" object and a \"required\" list. \
Each property should contain a title, a type (with values being text, number, boolean, date, password, select, phone, url, and time), \
and any other relevant properties such as minLength, maxLength, minimum and maximum. \
For the \"select\" type, the property should include the \"enum\" list.";

/// What the user asked the wizard for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRequest {
    pub form_type: String,
    pub num_fields: u32,
    pub description: String,
}

impl FormRequest {
    pub fn new(form_type: impl Into<String>, num_fields: u32, description: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            num_fields,
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.form_type.trim().is_empty() {
            return Err(RequestError::EmptyFormType);
        }
        if !(MIN_FIELDS..=MAX_FIELDS).contains(&self.num_fields) {
            return Err(RequestError::FieldCount {
                actual: self.num_fields,
                min: MIN_FIELDS,
                max: MAX_FIELDS,
            });
        }
        let chars = self.description.trim().chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            return Err(RequestError::DescriptionTooShort {
                actual: chars,
                min: MIN_DESCRIPTION_CHARS,
            });
        }
        Ok(())
    }
}

/// A ready-made wizard request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub form_type: String,
    pub num_fields: u32,
    pub form_description: String,
}

impl FormTemplate {
    pub fn to_request(&self) -> FormRequest {
        FormRequest::new(&self.form_type, self.num_fields, &self.form_description)
    }
}

impl From<&FormTemplate> for FormRequest {
    fn from(template: &FormTemplate) -> Self {
        template.to_request()
    }
}

/// Templates shipped when configuration provides none
pub fn default_templates() -> Vec<FormTemplate> {
    [
        ("Registration", 6, "Registration form for new members joining a community club."),
        ("Feedback", 5, "Collecting user feedback on a newly released product."),
        ("Order Form", 7, "Order form for purchasing products or services."),
        ("Event RSVP", 4, "Reply form for guests attending a company dinner event."),
        ("Job Application", 8, "Application form for candidates applying to an open position."),
    ]
    .into_iter()
    .map(|(form_type, num_fields, description)| FormTemplate {
        form_type: form_type.to_string(),
        num_fields,
        form_description: description.to_string(),
    })
    .collect()
}

/// Case-insensitive substring match on the template's form type
pub fn search_templates<'a>(templates: &'a [FormTemplate], query: &str) -> Vec<&'a FormTemplate> {
    let needle = query.to_lowercase();
    templates
        .iter()
        .filter(|t| t.form_type.to_lowercase().contains(&needle))
        .collect()
}

/// User prompt for a validated request
pub fn build_prompt(request: &FormRequest) -> String {
    format!(
        "Create a JSON schema for a {} form with {} fields.\n\
         Form Description: {}\n\
         The questions should be meaningful and not contain placeholders like question 1, question 2, etc.\n\
         The form should be user-friendly. The fields should be relevant to the form type.\n\
         The form should be a mixture of all the field types according to the form description.\n\
         The response should always be in JSON format, there should be no filler explanation.",
        request.form_type.trim(),
        request.num_fields,
        request.description.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> FormRequest {
        FormRequest::new("Order Form", 7, "Order form for purchasing products or services.")
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(request().validate(), Ok(()));
    }

    #[test]
    fn test_request_rules() {
        let mut r = request();
        r.form_type = "  ".to_string();
        assert_eq!(r.validate(), Err(RequestError::EmptyFormType));

        let mut r = request();
        r.num_fields = 0;
        assert!(matches!(r.validate(), Err(RequestError::FieldCount { actual: 0, .. })));
        r.num_fields = 21;
        assert!(r.validate().is_err());
        r.num_fields = 20;
        assert!(r.validate().is_ok());

        let mut r = request();
        r.description = "Too short".to_string();
        assert_eq!(
            r.validate(),
            Err(RequestError::DescriptionTooShort { actual: 9, min: 15 })
        );
    }

    #[test]
    fn test_prompt_mentions_request() {
        let prompt = build_prompt(&request());
        assert!(prompt.starts_with("Create a JSON schema for a Order Form form with 7 fields."));
        assert!(prompt.contains("Form Description: Order form for purchasing"));
    }

    #[test]
    fn test_template_search() {
        let templates = default_templates();
        let hits = search_templates(&templates, "ORDER");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].form_type, "Order Form");
        assert_eq!(search_templates(&templates, "").len(), templates.len());
        assert!(search_templates(&templates, "poll").is_empty());
    }

    #[test]
    fn test_default_templates_are_valid_requests() {
        for template in default_templates() {
            assert_eq!(template.to_request().validate(), Ok(()), "{}", template.form_type);
        }
    }
}
