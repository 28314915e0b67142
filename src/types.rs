//! Core types: schemas, submitted requests, and validation reports.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Returns the JSON type name for log and error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Registry key for a `(path, method)` pair.
///
/// The literal hyphen separator is part of the storage contract.
pub fn registry_key(path: &str, method: &str) -> String {
    format!("{}-{}", path, method)
}

/// Expected shape of one field within a schema section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Type tags checked in declared order.
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new<I, T>(name: impl Into<String>, types: I, required: bool) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
            required,
        }
    }
}

/// Field definitions of one section, keyed by field name.
pub type Section = HashMap<String, FieldDefinition>;

/// The three parts of a request that carry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    QueryParams,
    Headers,
    Body,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::QueryParams,
        SectionKind::Headers,
        SectionKind::Body,
    ];

    /// Wire name of the section in request payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::QueryParams => "query_params",
            SectionKind::Headers => "headers",
            SectionKind::Body => "body",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema as it appears in a registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub query_params: Vec<FieldDefinition>,
    #[serde(default)]
    pub headers: Vec<FieldDefinition>,
    #[serde(default)]
    pub body: Vec<FieldDefinition>,
}

/// Registered description of the expected fields for one `(path, method)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub path: String,
    pub method: String,
    pub query_params: Section,
    pub headers: Section,
    pub body: Section,
}

impl Schema {
    /// Key under which this schema is stored.
    pub fn key(&self) -> String {
        registry_key(&self.path, &self.method)
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::QueryParams => &self.query_params,
            SectionKind::Headers => &self.headers,
            SectionKind::Body => &self.body,
        }
    }
}

impl From<SchemaDefinition> for Schema {
    /// A name listed twice in one section keeps its last definition.
    fn from(def: SchemaDefinition) -> Self {
        fn index(fields: Vec<FieldDefinition>) -> Section {
            fields.into_iter().map(|f| (f.name.clone(), f)).collect()
        }

        Self {
            path: def.path,
            method: def.method,
            query_params: index(def.query_params),
            headers: index(def.headers),
            body: index(def.body),
        }
    }
}

/// One observed field: a name and whatever value the JSON decoder produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedField {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl SubmittedField {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An observed request to check against its registered schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub query_params: Vec<SubmittedField>,
    #[serde(default)]
    pub headers: Vec<SubmittedField>,
    #[serde(default)]
    pub body: Vec<SubmittedField>,
}

impl ValidationRequest {
    /// Create a request with empty sections.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query_params(mut self, fields: Vec<SubmittedField>) -> Self {
        self.query_params = fields;
        self
    }

    pub fn with_headers(mut self, fields: Vec<SubmittedField>) -> Self {
        self.headers = fields;
        self
    }

    pub fn with_body(mut self, fields: Vec<SubmittedField>) -> Self {
        self.body = fields;
        self
    }

    pub fn section(&self, kind: SectionKind) -> &[SubmittedField] {
        match kind {
            SectionKind::QueryParams => &self.query_params,
            SectionKind::Headers => &self.headers,
            SectionKind::Body => &self.body,
        }
    }
}

/// Kind of mismatch between a request and its schema.
///
/// Serializes to the literal strings of the response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "value type mismatch")]
    TypeMismatch,
    #[serde(rename = "missing required field")]
    MissingRequired,
    #[serde(rename = "unrecognized field")]
    UnrecognizedField,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "value type mismatch",
            ErrorKind::MissingRequired => "missing required field",
            ErrorKind::UnrecognizedField => "unrecognized field",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mismatch found in one section of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationError {
    pub field_name: String,
    #[serde(rename = "ErrorType")]
    pub kind: ErrorKind,
    /// Type tag that rejected the value; serialized as `""` when absent.
    #[serde(serialize_with = "empty_when_none")]
    pub expected_type: Option<String>,
    #[serde(rename = "ErrorValue")]
    pub offending_value: Option<Value>,
}

fn empty_when_none<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(""))
}

impl ValidationError {
    pub fn type_mismatch(field: impl Into<String>, tag: impl Into<String>, value: Value) -> Self {
        Self {
            field_name: field.into(),
            kind: ErrorKind::TypeMismatch,
            expected_type: Some(tag.into()),
            offending_value: Some(value),
        }
    }

    pub fn missing_required(field: impl Into<String>) -> Self {
        Self {
            field_name: field.into(),
            kind: ErrorKind::MissingRequired,
            expected_type: None,
            offending_value: None,
        }
    }

    pub fn unrecognized(field: impl Into<String>) -> Self {
        Self {
            field_name: field.into(),
            kind: ErrorKind::UnrecognizedField,
            expected_type: None,
            offending_value: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_name, self.kind)?;
        if let Some(tag) = &self.expected_type {
            write!(f, " (expected {}", tag)?;
            if let Some(value) = &self.offending_value {
                write!(f, ", got {}", value)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Outcome of comparing one request against its schema.
///
/// Immutable once built; `valid` is derived from the three error lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationReport {
    path: String,
    method: String,
    query_params: Vec<ValidationError>,
    headers: Vec<ValidationError>,
    body: Vec<ValidationError>,
    valid: bool,
}

impl ValidationReport {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        query_params: Vec<ValidationError>,
        headers: Vec<ValidationError>,
        body: Vec<ValidationError>,
    ) -> Self {
        let valid = query_params.is_empty() && headers.is_empty() && body.is_empty();
        Self {
            path: path.into(),
            method: method.into(),
            query_params,
            headers,
            body,
            valid,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn query_params(&self) -> &[ValidationError] {
        &self.query_params
    }

    pub fn headers(&self) -> &[ValidationError] {
        &self.headers
    }

    pub fn body(&self) -> &[ValidationError] {
        &self.body
    }

    pub fn section(&self, kind: SectionKind) -> &[ValidationError] {
        match kind {
            SectionKind::QueryParams => &self.query_params,
            SectionKind::Headers => &self.headers,
            SectionKind::Body => &self.body,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Total number of errors across all sections.
    pub fn error_count(&self) -> usize {
        self.query_params.len() + self.headers.len() + self.body.len()
    }
}

/// Result of a validate call.
///
/// `NotConfigured` means no schema is registered for the request's
/// `(path, method)`; it serializes to `null`, distinct from an empty report.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NotConfigured,
    Report(ValidationReport),
}

impl Outcome {
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Outcome::NotConfigured => None,
            Outcome::Report(report) => Some(report),
        }
    }

    pub fn into_report(self) -> Option<ValidationReport> {
        match self {
            Outcome::NotConfigured => None,
            Outcome::Report(report) => Some(report),
        }
    }

    /// True unless a report with at least one error was produced.
    pub fn is_valid(&self) -> bool {
        self.report().map_or(true, ValidationReport::is_valid)
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::NotConfigured => serializer.serialize_none(),
            Outcome::Report(report) => report.serialize(serializer),
        }
    }
}

/// What to do when a schema references a type tag with no predicate.
///
/// Either way the tag is skipped without producing an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTypePolicy {
    /// Skip silently (logged at debug level only).
    #[default]
    Ignore,
    /// Skip and emit a warning event.
    Warn,
}

/// Options for the validation engine.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub unknown_types: UnknownTypePolicy,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for type tags without a registered predicate.
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_key_uses_hyphen() {
        assert_eq!(registry_key("/users", "GET"), "/users-GET");
        assert_eq!(registry_key("", ""), "-");
    }

    #[test]
    fn schema_from_definition_indexes_by_name() {
        let def = SchemaDefinition {
            path: "/users".into(),
            method: "POST".into(),
            query_params: vec![],
            headers: vec![FieldDefinition::new("Authorization", ["BearerAuth"], true)],
            body: vec![
                FieldDefinition::new("name", ["String"], true),
                FieldDefinition::new("name", ["Int"], false),
            ],
        };

        let schema = Schema::from(def);
        assert_eq!(schema.key(), "/users-POST");
        assert!(schema.query_params.is_empty());
        assert!(schema.headers["Authorization"].required);
        // last definition of a repeated name wins
        assert_eq!(schema.body.len(), 1);
        assert_eq!(schema.body["name"].types, vec!["Int".to_string()]);
    }

    #[test]
    fn submitted_field_value_defaults_to_null() {
        let field: SubmittedField = serde_json::from_value(json!({ "name": "id" })).unwrap();
        assert_eq!(field.value, Value::Null);
    }

    #[test]
    fn type_mismatch_serializes_with_wire_names() {
        let err = ValidationError::type_mismatch("id", "Int", json!("abc"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "FieldName": "id",
                "ErrorType": "value type mismatch",
                "ExpectedType": "Int",
                "ErrorValue": "abc"
            })
        );
    }

    #[test]
    fn missing_required_serializes_empty_expected_type() {
        let err = ValidationError::missing_required("id");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "FieldName": "id",
                "ErrorType": "missing required field",
                "ExpectedType": "",
                "ErrorValue": null
            })
        );
    }

    #[test]
    fn report_validity_is_derived() {
        let report = ValidationReport::new("/a", "GET", vec![], vec![], vec![]);
        assert!(report.is_valid());

        let report = ValidationReport::new(
            "/a",
            "GET",
            vec![],
            vec![],
            vec![ValidationError::unrecognized("extra")],
        );
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn report_serializes_pascal_case() {
        let report = ValidationReport::new("/a", "GET", vec![], vec![], vec![]);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "Path": "/a",
                "Method": "GET",
                "QueryParams": [],
                "Headers": [],
                "Body": [],
                "Valid": true
            })
        );
    }

    #[test]
    fn not_configured_serializes_to_null() {
        assert_eq!(serde_json::to_value(Outcome::NotConfigured).unwrap(), Value::Null);
        assert!(Outcome::NotConfigured.is_valid());
        assert!(Outcome::NotConfigured.report().is_none());
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::type_mismatch("age", "Int", json!("25"));
        assert_eq!(
            err.to_string(),
            "age: value type mismatch (expected Int, got \"25\")"
        );
        assert_eq!(
            ValidationError::missing_required("id").to_string(),
            "id: missing required field"
        );
    }

    #[test]
    fn validate_options_builder() {
        let opts = ValidateOptions::new();
        assert_eq!(opts.unknown_types, UnknownTypePolicy::Ignore);

        let opts = ValidateOptions::new().unknown_types(UnknownTypePolicy::Warn);
        assert_eq!(opts.unknown_types, UnknownTypePolicy::Warn);
    }
}
