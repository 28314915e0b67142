//! Field checks for one section of a request.
//!
//! Two independent passes run per section:
//!
//! 1. Every submitted field, in submission order, is looked up by name. An
//!    unknown name yields one `UnrecognizedField` error and nothing else; a
//!    known name is checked against each declared type tag.
//! 2. Every definition marked `required` whose name was not submitted yields
//!    one `MissingRequired` error. These come from a hash map, so their order
//!    is unspecified.

use std::collections::HashSet;

use crate::types::{
    json_type_name, FieldDefinition, Section, SectionKind, SubmittedField, UnknownTypePolicy,
    ValidationError,
};
use crate::validators::ValidatorTable;

/// Errors found in one section plus the number of skipped type tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionCheck {
    pub errors: Vec<ValidationError>,
    /// Type tag references that had no predicate and were skipped.
    pub unknown_tags: usize,
}

/// Checks submitted fields against field definitions.
#[derive(Debug, Clone, Copy)]
pub struct FieldChecker<'a> {
    table: &'a ValidatorTable,
    policy: UnknownTypePolicy,
}

impl<'a> FieldChecker<'a> {
    pub fn new(table: &'a ValidatorTable, policy: UnknownTypePolicy) -> Self {
        Self { table, policy }
    }

    /// Run both passes over one section.
    ///
    /// Per-field errors come first, in submission order, followed by the
    /// missing required fields.
    pub fn check_section(
        &self,
        kind: SectionKind,
        submitted: &[SubmittedField],
        definitions: &Section,
    ) -> SectionCheck {
        let mut check = SectionCheck::default();
        let mut seen = HashSet::with_capacity(submitted.len());

        for field in submitted {
            seen.insert(field.name.as_str());
            self.check_field(kind, field, definitions, &mut check);
        }

        check.errors.extend(missing_required(definitions, &seen));
        check
    }

    /// Check one submitted field. Does not look at required flags.
    pub fn check_field(
        &self,
        kind: SectionKind,
        field: &SubmittedField,
        definitions: &Section,
        check: &mut SectionCheck,
    ) {
        match definitions.get(&field.name) {
            Some(definition) => self.check_every_declared_type(kind, field, definition, check),
            None => check.errors.push(ValidationError::unrecognized(&field.name)),
        }
    }

    /// Check the value against every registered tag the definition declares.
    ///
    /// Each rejecting tag adds its own error, so a value must satisfy all of
    /// them to pass. Tags without a predicate are skipped.
    fn check_every_declared_type(
        &self,
        kind: SectionKind,
        field: &SubmittedField,
        definition: &FieldDefinition,
        check: &mut SectionCheck,
    ) {
        for tag in &definition.types {
            let Some(predicate) = self.table.get(tag) else {
                check.unknown_tags += 1;
                self.report_unknown(kind, &field.name, tag);
                continue;
            };

            if !predicate(&field.value) {
                tracing::trace!(
                    section = %kind,
                    field = %field.name,
                    expected = %tag,
                    actual = json_type_name(&field.value),
                    "type mismatch"
                );
                check.errors.push(ValidationError::type_mismatch(
                    &field.name,
                    tag,
                    field.value.clone(),
                ));
            }
        }
    }

    fn report_unknown(&self, kind: SectionKind, field: &str, tag: &str) {
        match self.policy {
            UnknownTypePolicy::Ignore => {
                tracing::debug!(section = %kind, field, tag, "skipping unknown type tag")
            }
            UnknownTypePolicy::Warn => {
                tracing::warn!(section = %kind, field, tag, "skipping unknown type tag")
            }
        }
    }
}

/// One `MissingRequired` error per required definition absent from `submitted`.
pub fn missing_required(definitions: &Section, submitted: &HashSet<&str>) -> Vec<ValidationError> {
    definitions
        .values()
        .filter(|def| def.required && !submitted.contains(def.name.as_str()))
        .map(|def| ValidationError::missing_required(&def.name))
        .collect()
}
