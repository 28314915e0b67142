//! Payload loading from strings, files, and HTTP URLs.
//!
//! Registration payloads are checked against an embedded JSON Schema before
//! decoding, so structural problems come back as a list of JSON Pointer
//! locations instead of a single decoder message.

use std::path::Path;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{LoadError, PayloadError};
use crate::types::{json_type_name, SchemaDefinition, ValidationRequest};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

fn field_definition_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": { "type": "string" },
            "types": { "type": "array", "items": { "type": "string" } },
            "required": { "type": "boolean" }
        }
    })
}

fn schema_definition_schema() -> Value {
    let fields = json!({ "type": "array", "items": field_definition_schema() });
    json!({
        "type": "object",
        "required": ["path", "method"],
        "properties": {
            "path": { "type": "string" },
            "method": { "type": "string" },
            "query_params": fields,
            "headers": fields,
            "body": fields
        }
    })
}

fn validation_request_schema() -> Value {
    let fields = json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        }
    });
    json!({
        "type": "object",
        "required": ["path", "method"],
        "properties": {
            "path": { "type": "string" },
            "method": { "type": "string" },
            "query_params": fields,
            "headers": fields,
            "body": fields
        }
    })
}

fn compile(schema: Value) -> Validator {
    jsonschema::draft7::new(&schema).expect("embedded payload schema compiles")
}

fn registration_validator() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| compile(schema_definition_schema()))
}

fn registration_batch_validator() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        compile(json!({ "type": "array", "items": schema_definition_schema() }))
    })
}

fn request_validator() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| compile(validation_request_schema()))
}

/// Every structural error in `instance`, keyed by JSON Pointer.
fn check_structure(validator: &Validator, instance: &Value) -> Vec<PayloadError> {
    validator
        .iter_errors(instance)
        .map(|e| PayloadError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect()
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, LoadError> {
    serde_json::from_value(value).map_err(|source| LoadError::InvalidJson { source })
}

fn parse_json(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Decode a registration payload: one schema object or an array of them.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` for malformed JSON, or
/// `LoadError::InvalidPayload` when the document has the wrong shape.
pub fn parse_registrations(content: &str) -> Result<Vec<SchemaDefinition>, LoadError> {
    registrations_from_value(parse_json(content)?)
}

/// Decode an already-parsed registration payload.
pub fn registrations_from_value(value: Value) -> Result<Vec<SchemaDefinition>, LoadError> {
    let errors = match &value {
        Value::Array(_) => check_structure(registration_batch_validator(), &value),
        Value::Object(_) => check_structure(registration_validator(), &value),
        other => vec![PayloadError {
            path: String::new(),
            message: format!(
                "expected a schema object or an array of schemas, got {}",
                json_type_name(other)
            ),
        }],
    };
    if !errors.is_empty() {
        return Err(LoadError::InvalidPayload { errors });
    }

    let entries = match value {
        Value::Array(entries) => entries,
        entry => vec![entry],
    };
    entries.into_iter().map(decode).collect()
}

/// Decode a validate-request payload.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` for malformed JSON, or
/// `LoadError::InvalidPayload` when the document has the wrong shape.
pub fn parse_request(content: &str) -> Result<ValidationRequest, LoadError> {
    request_from_value(parse_json(content)?)
}

/// Decode an already-parsed validate-request payload.
pub fn request_from_value(value: Value) -> Result<ValidationRequest, LoadError> {
    let errors = check_structure(request_validator(), &value);
    if !errors.is_empty() {
        return Err(LoadError::InvalidPayload { errors });
    }
    decode(value)
}

/// Read a file into a string.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist.
pub fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetch a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub fn fetch_url(url: &str) -> Result<String, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Read a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn read_source(source: &str) -> Result<String, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            fetch_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        read_file(Path::new(source))
    }
}

/// Load a registration payload from a file path or URL.
pub fn load_registrations(source: &str) -> Result<Vec<SchemaDefinition>, LoadError> {
    parse_registrations(&read_source(source)?)
}

/// Load a validate-request payload from a file path or URL.
pub fn load_request(source: &str) -> Result<ValidationRequest, LoadError> {
    parse_request(&read_source(source)?)
}
