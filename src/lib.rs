//! API Request Validator
//!
//! Register the expected shape of an API endpoint (per path and method: which
//! query parameters, headers, and body fields exist, their accepted types, and
//! whether they are required), then check observed requests against it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use api_validator::{
//!     FieldDefinition, Outcome, SchemaDefinition, SchemaRegistry, SubmittedField,
//!     ValidationEngine, ValidationRequest,
//! };
//! use serde_json::json;
//!
//! let registry = Arc::new(SchemaRegistry::in_memory());
//! registry
//!     .register(SchemaDefinition {
//!         path: "/users".into(),
//!         method: "GET".into(),
//!         query_params: vec![FieldDefinition::new("id", ["Int"], true)],
//!         headers: vec![],
//!         body: vec![],
//!     })
//!     .unwrap();
//!
//! let engine = ValidationEngine::new(Arc::clone(&registry));
//! let request = ValidationRequest::new("/users", "GET")
//!     .with_query_params(vec![SubmittedField::new("id", "abc")]);
//!
//! let report = engine.validate(&request).into_report().unwrap();
//! assert!(!report.is_valid());
//! assert_eq!(
//!     serde_json::to_value(&report.query_params()[0]).unwrap(),
//!     json!({
//!         "FieldName": "id",
//!         "ErrorType": "value type mismatch",
//!         "ExpectedType": "Int",
//!         "ErrorValue": "abc"
//!     })
//! );
//!
//! // No schema for this pair: nothing to report, which is not the same as
//! // an empty report.
//! let outcome = engine.validate(&ValidationRequest::new("/orders", "GET"));
//! assert_eq!(outcome, Outcome::NotConfigured);
//! ```
//!
//! # Error Kinds
//!
//! | Kind | When | `ExpectedType` | `ErrorValue` |
//! |------|------|----------------|--------------|
//! | `value type mismatch` | a declared tag rejects the value | the tag | the value |
//! | `missing required field` | a required field was not submitted | `""` | `null` |
//! | `unrecognized field` | a submitted field has no definition | `""` | `null` |
//!
//! Type tags with no registered predicate are skipped; see
//! [`UnknownTypePolicy`].

mod checker;
mod engine;
mod error;
mod loader;
mod registry;
mod types;
mod validators;

#[cfg(feature = "server")]
pub mod server;

pub use checker::{missing_required, FieldChecker, SectionCheck};
pub use engine::ValidationEngine;
pub use error::{LoadError, PayloadError, RegisterError, StoreError};
pub use loader::{
    is_url, load_registrations, load_request, parse_registrations, parse_request, read_file,
    read_source, registrations_from_value, request_from_value,
};
pub use registry::{MemoryStore, SchemaRegistry, SchemaStore};
pub use types::{
    json_type_name, registry_key, ErrorKind, FieldDefinition, Outcome, Schema, SchemaDefinition,
    Section, SectionKind, SubmittedField, UnknownTypePolicy, ValidateOptions, ValidationError,
    ValidationReport, ValidationRequest,
};
pub use validators::{
    is_bearer_auth, is_boolean, is_date, is_email, is_int, is_list, is_string, is_uuid,
    Predicate, ValidatorTable,
};

#[cfg(feature = "remote")]
pub use loader::fetch_url;
