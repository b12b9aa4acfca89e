//! Legacy Schema Format
//!
//! Legacy extension schemas have no `name` and describe their configuration
//! as a loosely-typed table of field descriptors:
//!
//! ```json
//! {
//!   "no_consumer": true,
//!   "fields": {
//!     "upstream": { "type": "url", "required": true },
//!     "limits":   { "type": "table", "schema": { "fields": {
//!       "minute": { "type": "number", "default": 60 }
//!     }}}
//!   }
//! }
//! ```
//!
//! This module is the untyped boundary. Every descriptor key is matched
//! against the closed [`FieldAttribute`] set and every `type` against
//! [`LegacyType`]; anything else is rejected here, so [`convert`] only ever
//! sees well-formed [`LegacySchema`] trees. A descriptor carrying `new_type`
//! is taken as-is and its other keys are not inspected.

pub mod convert;

pub use convert::{convert_legacy_schema, HookPolicy, LegacyConverter};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConversionError;
use crate::schema::FieldDefinition;
use crate::typedefs::Marker;

/// Whether a raw schema is in the legacy format
///
/// Modern schemas always carry a `name`; legacy ones never do.
pub fn is_legacy(raw: &Value) -> bool {
    raw.get("name").is_none()
}

// =============================================================================
// Attributes and Types
// =============================================================================

/// The attributes a legacy field descriptor may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAttribute {
    Type,
    Schema,
    Immutable,
    Enum,
    Default,
    Required,
    Unique,
    /// Custom validation hook; has no modern equivalent
    Func,
    /// Escape hatch: the value is already a modern field definition
    NewType,
}

impl FieldAttribute {
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "type" => Self::Type,
            "schema" => Self::Schema,
            "immutable" => Self::Immutable,
            "enum" => Self::Enum,
            "default" => Self::Default,
            "required" => Self::Required,
            "unique" => Self::Unique,
            "func" => Self::Func,
            "new_type" => Self::NewType,
            _ => return None,
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Schema => "schema",
            Self::Immutable => "immutable",
            Self::Enum => "enum",
            Self::Default => "default",
            Self::Required => "required",
            Self::Unique => "unique",
            Self::Func => "func",
            Self::NewType => "new_type",
        }
    }
}

/// Legacy field type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyType {
    Url,
    Table,
    Array,
    Timestamp,
    String,
    Number,
    Boolean,
}

impl LegacyType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "url" => Self::Url,
            "table" => Self::Table,
            "array" => Self::Array,
            "timestamp" => Self::Timestamp,
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            _ => return None,
        })
    }
}

// =============================================================================
// Parsed Tree
// =============================================================================

/// A legacy field descriptor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyField {
    pub name: String,
    /// Dotted path from the schema root, used in error messages
    pub path: String,
    pub ty: Option<LegacyType>,
    pub schema: Option<LegacySchema>,
    pub allowed: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub unique: Option<bool>,
    pub immutable: bool,
    pub has_hook: bool,
    pub new_type: Option<FieldDefinition>,
}

/// A legacy schema (root or nested table schema)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacySchema {
    /// Fields in name order
    pub fields: Vec<LegacyField>,
    /// Nested tables only: no fixed field set, keyed by arbitrary strings
    pub flexible: bool,
    pub markers: Vec<Marker>,
    pub entity_checks: Option<Value>,
}

impl LegacySchema {
    /// Parse an untyped legacy schema
    pub fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Self::parse(value, "")
    }

    fn parse(value: &Value, prefix: &str) -> Result<Self, ConversionError> {
        let location = if prefix.is_empty() { "@root" } else { prefix };
        let table = value
            .as_object()
            .ok_or_else(|| malformed(location, "schema must be a table"))?;

        let fields = match table.get("fields") {
            Some(Value::Object(fields)) => parse_fields(fields, prefix)?,
            Some(_) => return Err(malformed(location, "'fields' must be a table")),
            None => return Err(malformed(location, "missing 'fields' table")),
        };

        let mut markers = Vec::new();
        for marker in Marker::ALL {
            if flag(table, marker.legacy_key(), location)? {
                markers.push(marker);
            }
        }

        for key in table.keys() {
            let known = matches!(key.as_str(), "fields" | "flexible" | "entity_checks")
                || Marker::ALL.iter().any(|m| m.legacy_key() == key);
            if !known {
                debug!(schema = location, key = %key, "ignoring legacy schema key");
            }
        }

        Ok(Self {
            fields,
            flexible: flag(table, "flexible", location)?,
            markers,
            entity_checks: table.get("entity_checks").cloned(),
        })
    }
}

fn parse_fields(fields: &Map<String, Value>, prefix: &str) -> Result<Vec<LegacyField>, ConversionError> {
    fields
        .iter()
        .map(|(name, descriptor)| {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            parse_field(name, path, descriptor)
        })
        .collect()
}

fn parse_field(name: &str, path: String, descriptor: &Value) -> Result<LegacyField, ConversionError> {
    let table = descriptor
        .as_object()
        .ok_or_else(|| malformed(&path, "field descriptor must be a table"))?;

    let mut field = LegacyField {
        name: name.to_string(),
        path,
        ..LegacyField::default()
    };

    // An already-modern field skips every legacy attribute
    if let Some(value) = table.get(FieldAttribute::NewType.key()) {
        let definition = serde_json::from_value(value.clone()).map_err(|source| {
            ConversionError::InvalidNewType {
                field: field.path.clone(),
                source,
            }
        })?;
        field.new_type = Some(definition);
        return Ok(field);
    }

    for (key, value) in table {
        let attribute = FieldAttribute::from_key(key).ok_or_else(|| {
            ConversionError::UnknownLegacyFieldAttribute {
                field: field.path.clone(),
                attribute: key.clone(),
            }
        })?;

        match attribute {
            FieldAttribute::Type => {
                let type_name = value
                    .as_str()
                    .ok_or_else(|| invalid(&field.path, attribute, "a string"))?;
                let ty = LegacyType::from_name(type_name).ok_or_else(|| {
                    ConversionError::UnknownLegacyFieldType {
                        field: field.path.clone(),
                        type_name: type_name.to_string(),
                    }
                })?;
                field.ty = Some(ty);
            }
            FieldAttribute::Schema => {
                field.schema = Some(LegacySchema::parse(value, &field.path)?);
            }
            FieldAttribute::Immutable => field.immutable = true,
            FieldAttribute::Enum => {
                let values = value
                    .as_array()
                    .ok_or_else(|| invalid(&field.path, attribute, "an array"))?;
                if values.is_empty() {
                    debug!(field = %field.path, "ignoring empty 'enum'");
                } else {
                    field.allowed = Some(values.clone());
                }
            }
            FieldAttribute::Default => field.default = Some(value.clone()),
            FieldAttribute::Required => {
                field.required = Some(
                    value
                        .as_bool()
                        .ok_or_else(|| invalid(&field.path, attribute, "a boolean"))?,
                );
            }
            FieldAttribute::Unique => {
                field.unique = Some(
                    value
                        .as_bool()
                        .ok_or_else(|| invalid(&field.path, attribute, "a boolean"))?,
                );
            }
            FieldAttribute::Func => field.has_hook = true,
            // Handled before the loop
            FieldAttribute::NewType => {}
        }
    }

    Ok(field)
}

fn flag(table: &Map<String, Value>, key: &'static str, location: &str) -> Result<bool, ConversionError> {
    match table.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(set)) => Ok(*set),
        Some(_) => Err(ConversionError::InvalidLegacyAttribute {
            field: location.to_string(),
            attribute: key,
            expected: "a boolean",
        }),
    }
}

fn malformed(path: &str, reason: &str) -> ConversionError {
    ConversionError::MalformedLegacySchema {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn invalid(field: &str, attribute: FieldAttribute, expected: &'static str) -> ConversionError {
    ConversionError::InvalidLegacyAttribute {
        field: field.to_string(),
        attribute: attribute.key(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_keys_round_trip() {
        for key in ["type", "schema", "immutable", "enum", "default", "required", "unique", "func", "new_type"] {
            assert_eq!(FieldAttribute::from_key(key).map(|a| a.key()), Some(key));
        }
        assert_eq!(FieldAttribute::from_key("len_min"), None);
    }

    #[test]
    fn test_is_legacy() {
        assert!(is_legacy(&json!({ "fields": {} })));
        assert!(!is_legacy(&json!({ "name": "acl", "fields": [] })));
    }

    #[test]
    fn test_parse_nested_paths() {
        let schema = LegacySchema::from_value(&json!({
            "no_consumer": true,
            "fields": {
                "limits": { "type": "table", "schema": { "flexible": true, "fields": {
                    "minute": { "type": "number", "default": 60 }
                }}}
            }
        }))
        .unwrap();

        assert_eq!(schema.markers, vec![Marker::NoConsumer]);
        let limits = &schema.fields[0];
        assert_eq!(limits.ty, Some(LegacyType::Table));
        let nested = limits.schema.as_ref().unwrap();
        assert!(nested.flexible);
        assert_eq!(nested.fields[0].path, "limits.minute");
        assert_eq!(nested.fields[0].default, Some(json!(60)));
    }

    #[test]
    fn test_unknown_attribute_names_field() {
        let err = LegacySchema::from_value(&json!({
            "fields": { "outer": { "type": "table", "schema": { "fields": {
                "inner": { "type": "string", "len_min": 3 }
            }}}}
        }))
        .unwrap_err();

        match err {
            ConversionError::UnknownLegacyFieldAttribute { field, attribute } => {
                assert_eq!(field, "outer.inner");
                assert_eq!(attribute, "len_min");
            }
            other => panic!("Expected UnknownLegacyFieldAttribute, got {:?}", other),
        }
    }

    #[test]
    fn test_wrongly_typed_attributes() {
        let err = LegacySchema::from_value(&json!({
            "fields": { "flag": { "type": "boolean", "required": "yes" } }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::InvalidLegacyAttribute { attribute: "required", .. }
        ));

        let err = LegacySchema::from_value(&json!({ "fields": [] })).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedLegacySchema { .. }));
    }

    #[test]
    fn test_new_type_skips_other_attributes() {
        let schema = LegacySchema::from_value(&json!({
            "fields": { "port": { "type": "integer", "unique": 1, "new_type": { "type": "number" } } }
        }))
        .unwrap();

        let port = &schema.fields[0];
        assert_eq!(port.new_type, Some(FieldDefinition::number()));
        assert_eq!(port.ty, None);
        assert_eq!(port.unique, None);

        let err = LegacySchema::from_value(&json!({
            "fields": { "port": { "new_type": { "type": "widget" } } }
        }))
        .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNewType { field, .. } if field == "port"));
    }

    #[test]
    fn test_empty_enum_is_ignored() {
        let schema = LegacySchema::from_value(&json!({
            "fields": { "mode": { "type": "string", "enum": [] } }
        }))
        .unwrap();
        assert_eq!(schema.fields[0].allowed, None);
    }
}
