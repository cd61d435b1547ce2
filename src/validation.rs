//! # Payload Validation
//!
//! This module applies a source's stored validation contract to an incoming
//! payload: required-field presence and runtime type checks against a closed
//! set of type tags. Validation is pure and reads the contract fresh from the
//! schema row handed in by the caller; nothing here touches the database.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::models::source_schema;

/// Closed set of type tags a schema may declare for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Parse a stored type tag. Unknown tags yield `None` and are skipped by
    /// the validator, so dashboard-side additions do not break older payloads.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total runtime classification of a JSON value into the tag vocabulary.
/// Arrays are distinguished from plain objects; `null` classifies as unknown.
pub fn classify(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "unknown",
    }
}

/// A source's validation contract, parsed from its schema row.
#[derive(Debug, Clone, Default)]
pub struct SchemaRules {
    required_fields: Vec<String>,
    field_types: BTreeMap<String, FieldType>,
}

impl SchemaRules {
    /// Build rules from the stored JSON columns. Non-string entries in the
    /// required list and unrecognized type tags are ignored.
    pub fn from_model(model: &source_schema::Model) -> Self {
        let mut required_fields = Vec::new();
        if let Value::Array(names) = &model.required_fields {
            for name in names {
                if let Value::String(name) = name
                    && !name.is_empty()
                    && !required_fields.contains(name)
                {
                    required_fields.push(name.clone());
                }
            }
        }

        let mut field_types = BTreeMap::new();
        if let Value::Object(types) = &model.field_types {
            for (name, tag) in types {
                if let Value::String(tag) = tag
                    && let Some(field_type) = FieldType::from_tag(tag)
                {
                    field_types.insert(name.clone(), field_type);
                }
            }
        }

        Self {
            required_fields,
            field_types,
        }
    }

    /// Construct rules directly, bypassing the stored JSON representation.
    pub fn new(required_fields: Vec<String>, field_types: BTreeMap<String, FieldType>) -> Self {
        Self {
            required_fields,
            field_types,
        }
    }

    /// Validate a payload against this contract, returning every rule failure.
    /// An empty result means the payload is acceptable.
    pub fn validate(&self, payload: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();

        for name in &self.required_fields {
            if is_absent(payload.get(name)) {
                errors.push(format!("Missing required field: {}", name));
            }
        }

        for (name, expected) in &self.field_types {
            let Some(value) = payload.get(name) else {
                continue;
            };
            if is_absent(Some(value)) {
                continue;
            }
            let actual = classify(value);
            if actual != expected.as_str() {
                errors.push(format!(
                    "Field {} should be type {}, got {}",
                    name, expected, actual
                ));
            }
        }

        errors
    }
}

/// A field counts as absent when it is missing, JSON null, or an empty string.
fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
