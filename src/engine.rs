//! Validation engine: schema lookup, section checks, and report assembly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::checker::FieldChecker;
use crate::registry::{MemoryStore, SchemaRegistry, SchemaStore};
use crate::types::{
    Outcome, Schema, SectionKind, ValidateOptions, ValidationReport, ValidationRequest,
};
use crate::validators::ValidatorTable;

/// Validates requests against the schemas of an injected registry.
///
/// Apart from the registry lookup, validation is a pure function of the
/// schema and the request.
#[derive(Debug)]
pub struct ValidationEngine<S = MemoryStore> {
    registry: Arc<SchemaRegistry<S>>,
    table: ValidatorTable,
    options: ValidateOptions,
    unknown_types: AtomicU64,
}

impl<S: SchemaStore> ValidationEngine<S> {
    /// Engine with the built-in validator table and default options.
    pub fn new(registry: Arc<SchemaRegistry<S>>) -> Self {
        Self::with_table(registry, ValidatorTable::builtin(), ValidateOptions::default())
    }

    pub fn with_table(
        registry: Arc<SchemaRegistry<S>>,
        table: ValidatorTable,
        options: ValidateOptions,
    ) -> Self {
        Self {
            registry,
            table,
            options,
            unknown_types: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry<S>> {
        &self.registry
    }

    pub fn table(&self) -> &ValidatorTable {
        &self.table
    }

    /// Number of type tag references skipped because no predicate exists.
    pub fn unknown_type_count(&self) -> u64 {
        self.unknown_types.load(Ordering::Relaxed)
    }

    /// Validate a request against the schema registered for its path and method.
    ///
    /// Returns [`Outcome::NotConfigured`] when no schema is registered.
    pub fn validate(&self, request: &ValidationRequest) -> Outcome {
        match self.registry.lookup(&request.path, &request.method) {
            Some(schema) => Outcome::Report(self.validate_against(&schema, request)),
            None => Outcome::NotConfigured,
        }
    }

    /// Validate a request against an explicit schema, bypassing the registry.
    pub fn validate_against(&self, schema: &Schema, request: &ValidationRequest) -> ValidationReport {
        let checker = FieldChecker::new(&self.table, self.options.unknown_types);

        let [query_params, headers, body] = SectionKind::ALL.map(|kind| {
            let check = checker.check_section(kind, request.section(kind), schema.section(kind));
            if check.unknown_tags > 0 {
                self.unknown_types
                    .fetch_add(check.unknown_tags as u64, Ordering::Relaxed);
            }
            check.errors
        });

        let report = ValidationReport::new(
            request.path.as_str(),
            request.method.as_str(),
            query_params,
            headers,
            body,
        );
        tracing::debug!(
            path = %report.path(),
            method = %report.method(),
            valid = report.is_valid(),
            errors = report.error_count(),
            "validated request"
        );
        report
    }
}
