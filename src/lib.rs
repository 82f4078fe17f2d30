//! # Formwright - Dynamic Schema Form Engine
//!
//! Formwright turns loosely-typed JSON produced by a language model into a
//! canonical form [`Schema`], validates answers against it, exports it as CSV
//! and edits it without ever mutating a Schema in place.
//!
//! ## Features
//!
//! - **Normalization**: malformed or partial model output degrades field by field
//!   instead of failing the whole form
//! - **Validation**: per-field rules from a fixed type registry
//! - **Copy-on-write editing**: add, remove, update and rename fields
//! - **CSV export**: schema and answer exports with standard quoting
//! - **Generation**: one completion call per wizard request, with per-user quotas
//!
//! ## Quick Start
//!
//! ```rust
//! use formwright::{normalize, FormRuntime};
//!
//! let schema = normalize(
//!     r#"{"properties":{"email":{"type":"string","format":"email"}},"required":["email"]}"#,
//! )?;
//! let mut form = FormRuntime::new(schema)?;
//! assert!(!form.is_submittable());
//!
//! form.set_value("email", "a@b.com")?;
//! assert!(form.is_submittable());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **Schema**: canonical model, normalizer, type registry and editor
//! - **Form**: live answer state for one session
//! - **Export**: CSV rendering and download descriptors
//! - **Generation / Persistence**: completion client and document store ports
//! - **Config**: layered settings

pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod generation;
pub mod persistence;
pub mod schema;

pub use error::{EditError, FormError, SchemaError};
pub use export::{csv_download, responses_to_csv, to_csv, CsvDownload};
pub use form::{FieldValue, FormData, FormRuntime, InvalidReason, ValidationResult};
pub use schema::{
    add_field, normalize, remove_field, rename_key, rules_for, set_title, update_field,
    Constraints, FieldDescriptor, FieldDraft, FieldPatch, FieldRenderRules, FieldType, Schema,
};
