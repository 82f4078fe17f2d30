//! Export of schemas and answers as downloadable CSV

mod csv;

pub use csv::{responses_to_csv, to_csv, SCHEMA_HEADER};

use crate::schema::Schema;

/// Filename used when a Schema has no usable title
pub const DEFAULT_FALLBACK_FILENAME: &str = "form-data.csv";

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// A CSV artifact ready to hand to whatever performs the download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDownload {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Schema export named after the Schema title, or `fallback`
pub fn csv_download(schema: &Schema, fallback: &str) -> CsvDownload {
    CsvDownload {
        filename: download_filename(schema, fallback),
        content_type: CSV_CONTENT_TYPE,
        body: to_csv(schema),
    }
}

fn download_filename(schema: &Schema, fallback: &str) -> String {
    let slug = schema.title.as_deref().map(slugify).unwrap_or_default();
    if slug.is_empty() {
        fallback.to_string()
    } else {
        format!("{}.csv", slug)
    }
}

/// Lowercase ASCII words joined by single dashes
fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
