//! Modern schema types
//!
//! A [`SchemaDefinition`] is the typed form handed to the meta-schema
//! validator and the entity-construction engine. Field types are a tagged
//! union: each [`FieldType`] variant carries only the payload that applies to
//! it, and the attributes shared by every field live on [`FieldDefinition`].
//!
//! The JSON form mirrors the Rust shape:
//!
//! ```json
//! {
//!   "name": "rate-limiting",
//!   "fields": [
//!     { "name": "config", "type": "record", "required": true, "fields": [
//!       { "name": "minute", "type": "number" },
//!       { "name": "policy", "type": "string", "len_min": 0, "one_of": ["local", "cluster"] }
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::url;

/// Type tag and type-specific payload of a modern field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len_min: Option<u64>,
    },
    Number {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        timestamp: bool,
    },
    Boolean,
    Array {
        elements: Box<FieldDefinition>,
    },
    Record {
        fields: Vec<NamedField>,
    },
    Map {
        keys: Box<FieldDefinition>,
        values: Box<FieldDefinition>,
    },
    Foreign {
        reference: String,
        /// The owning entity must not carry a value for this reference
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        forbidden: bool,
    },
}

impl FieldType {
    /// Name of the type tag as it appears in JSON
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Number { .. } => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array { .. } => "array",
            FieldType::Record { .. } => "record",
            FieldType::Map { .. } => "map",
            FieldType::Foreign { .. } => "foreign",
        }
    }
}

/// Validators that can be attached to a field by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomValidator {
    /// Value must be a string shaped like `scheme://host[/path]`
    Url,
}

impl CustomValidator {
    /// Check a configuration value
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            CustomValidator::Url => {
                let text = value
                    .as_str()
                    .ok_or_else(|| "expected a string".to_string())?;
                url::validate_url(text)
            }
        }
    }
}

/// A field definition: a type plus the attributes every field may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(flatten)]
    pub kind: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_validator: Option<CustomValidator>,
}

impl FieldDefinition {
    pub fn new(kind: FieldType) -> Self {
        Self {
            kind,
            default: None,
            required: None,
            unique: None,
            auto: None,
            one_of: None,
            custom_validator: None,
        }
    }

    /// Plain string without a length constraint
    pub fn string() -> Self {
        Self::new(FieldType::String { len_min: None })
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number { timestamp: false })
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn array(elements: FieldDefinition) -> Self {
        Self::new(FieldType::Array { elements: Box::new(elements) })
    }

    pub fn record(fields: Vec<NamedField>) -> Self {
        Self::new(FieldType::Record { fields })
    }

    pub fn map(keys: FieldDefinition, values: FieldDefinition) -> Self {
        Self::new(FieldType::Map { keys: Box::new(keys), values: Box::new(values) })
    }

    pub fn foreign(reference: impl Into<String>) -> Self {
        Self::new(FieldType::Foreign { reference: reference.into(), forbidden: false })
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// Nested fields when this is a record
    pub fn fields(&self) -> Option<&[NamedField]> {
        match &self.kind {
            FieldType::Record { fields } => Some(fields.as_slice()),
            _ => None,
        }
    }
}

/// A field definition bound to its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
    #[serde(flatten)]
    pub definition: FieldDefinition,
}

impl NamedField {
    pub fn new(name: impl Into<String>, definition: FieldDefinition) -> Self {
        Self { name: name.into(), definition }
    }
}

/// A complete modern schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    pub fields: Vec<NamedField>,
    /// Cross-field check directives, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_checks: Option<Value>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<NamedField>) -> Self {
        Self {
            name: name.into(),
            primary_key: Vec::new(),
            fields,
            entity_checks: None,
        }
    }

    /// Get a top-level field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.definition)
    }

    /// Entity names referenced by top-level foreign fields
    pub fn foreign_references(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.definition.kind {
                FieldType::Foreign { reference, .. } => Some(reference.as_str()),
                _ => None,
            })
            .collect()
    }
}
