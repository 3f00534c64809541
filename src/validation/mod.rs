//! Input validation
//!
//! Declarative input filters evaluated against JSON request payloads.
//! Each write endpoint owns a filter describing its fields: scalar rules
//! (UUID, string length, enum membership, date, e-mail, IP), database
//! existence rules, nested object fields and collections.
//!
//! Filters are built once per request via the constructors in
//! [`filters`] and evaluated with [`InputFilter::validate`], which needs
//! a database pool for the existence rules. Failures come back as a
//! nested error map keyed by field name (and by element index inside
//! collections); the API layer wraps the map in a 400 response.

pub mod filter;
pub mod filters;
pub mod rules;

pub use filter::{Field, InputFilter};
pub use rules::Rule;

use serde_json::{Map, Value};

/// Whether a payload is being validated for record creation or update.
///
/// Create expects the `id` to be free (`NoRecordExists`); update expects
/// it to be taken (`RecordExists`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Create,
    Update,
}

/// Outcome of running an input filter.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    errors: Map<String, Value>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the payload passed every rule
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record an error for a field under a rule key
    pub fn add_error(&mut self, field: &str, rule: &str, message: impl Into<String>) {
        let entry = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(rule.to_string(), Value::String(message.into()));
        }
    }

    /// Record a nested error map for a field (object and collection fields)
    pub fn add_nested(&mut self, field: &str, nested: Value) {
        self.errors.insert(field.to_string(), nested);
    }

    /// The error map, keyed by field name
    pub fn errors(&self) -> &Map<String, Value> {
        &self.errors
    }

    /// Consume the result into a JSON error tree
    pub fn into_value(self) -> Value {
        Value::Object(self.errors)
    }
}
