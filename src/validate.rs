//! Meta-schema Validation
//!
//! Checks a modern [`SchemaDefinition`] for internal well-formedness before it
//! is registered. The serialized definition is validated against an embedded
//! JSON Schema; structural rules JSON Schema cannot express (unique field
//! names per record, primary keys naming real fields) are checked directly.
//! Violations are keyed by JSON pointer into the serialized definition.

use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::SchemaViolation;
use crate::schema::{FieldDefinition, FieldType, NamedField, SchemaDefinition};

const META_SCHEMA: &str = include_str!("meta_schema.json");

/// Validator for modern schema definitions
pub trait SchemaValidator {
    fn validate(&self, definition: &SchemaDefinition) -> Result<(), SchemaViolation>;
}

/// Validator that accepts everything, for when validation is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipValidation;

impl SchemaValidator for SkipValidation {
    fn validate(&self, _definition: &SchemaDefinition) -> Result<(), SchemaViolation> {
        Ok(())
    }
}

/// Validator backed by the embedded meta-schema
pub struct MetaSchemaValidator {
    compiled: JSONSchema,
}

impl MetaSchemaValidator {
    pub fn new() -> anyhow::Result<Self> {
        let meta: Value = serde_json::from_str(META_SCHEMA)?;
        let compiled = JSONSchema::compile(&meta)
            .map_err(|e| anyhow::anyhow!("Failed to compile meta-schema: {}", e))?;
        Ok(Self { compiled })
    }

    /// Validate an arbitrary JSON document against the meta-schema
    pub fn validate_value(&self, instance: &Value) -> Result<(), SchemaViolation> {
        let mut violation = SchemaViolation::new();
        if let Err(errors) = self.compiled.validate(instance) {
            for error in errors {
                violation.push(error.instance_path.to_string(), error.to_string());
            }
        }
        if violation.is_empty() {
            Ok(())
        } else {
            Err(violation)
        }
    }
}

impl SchemaValidator for MetaSchemaValidator {
    fn validate(&self, definition: &SchemaDefinition) -> Result<(), SchemaViolation> {
        let mut violation = match serde_json::to_value(definition) {
            Ok(instance) => self.validate_value(&instance).err().unwrap_or_default(),
            Err(e) => {
                let mut violation = SchemaViolation::new();
                violation.push("", format!("definition does not serialize: {}", e));
                violation
            }
        };

        check_fields(&definition.fields, "/fields", &mut violation);

        let top_level: HashSet<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
        for (i, key) in definition.primary_key.iter().enumerate() {
            if !top_level.contains(key.as_str()) {
                violation.push(format!("/primary_key/{}", i), format!("unknown field '{}'", key));
            }
        }

        if violation.is_empty() {
            Ok(())
        } else {
            Err(violation)
        }
    }
}

fn check_fields(fields: &[NamedField], pointer: &str, violation: &mut SchemaViolation) {
    let mut seen = HashSet::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let path = format!("{}/{}", pointer, i);
        if !seen.insert(field.name.as_str()) {
            violation.push(path.clone(), format!("duplicate field name '{}'", field.name));
        }
        check_field(&field.definition, &path, violation);
    }
}

fn check_field(field: &FieldDefinition, path: &str, violation: &mut SchemaViolation) {
    if field.custom_validator.is_some() && !matches!(field.kind, FieldType::String { .. }) {
        violation.push(path, format!("custom validator on a {} field", field.kind.tag()));
    }

    match &field.kind {
        FieldType::Array { elements } => check_field(elements, &format!("{}/elements", path), violation),
        FieldType::Record { fields } => check_fields(fields, &format!("{}/fields", path), violation),
        FieldType::Map { keys, values } => {
            check_field(keys, &format!("{}/keys", path), violation);
            check_field(values, &format!("{}/values", path), violation);
        }
        FieldType::String { .. } | FieldType::Number { .. } | FieldType::Boolean | FieldType::Foreign { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::convert_legacy_schema;
    use serde_json::json;

    fn validator() -> MetaSchemaValidator {
        MetaSchemaValidator::new().unwrap()
    }

    #[test]
    fn test_converted_schema_is_valid() {
        let schema = convert_legacy_schema("p", &json!({
            "no_consumer": true,
            "fields": {
                "url": { "type": "url" },
                "headers": { "type": "table" },
                "methods": { "type": "array", "enum": ["GET"] },
                "limits": { "type": "table", "schema": { "fields": {
                    "minute": { "type": "number", "default": 60 }
                }}},
                "created_at": { "type": "timestamp" }
            }
        }))
        .unwrap();
        assert_eq!(validator().validate(&schema), Ok(()));
    }

    #[test]
    fn test_raw_document_violations() {
        let violation = validator()
            .validate_value(&json!({
                "name": "p",
                "fields": [ { "name": "bad", "type": "array" } ]
            }))
            .unwrap_err();
        assert!(!violation.at("/fields/0").is_empty());

        let violation = validator().validate_value(&json!({ "fields": [] })).unwrap_err();
        assert!(!violation.at("@schema").is_empty());
    }

    #[test]
    fn test_default_must_match_type() {
        let schema = SchemaDefinition::new(
            "p",
            vec![NamedField::new("n", FieldDefinition::number().with_default(json!("ten")))],
        );
        let violation = validator().validate(&schema).unwrap_err();
        assert!(violation.errors.keys().any(|k| k.starts_with("/fields/0")));
    }

    #[test]
    fn test_structural_checks() {
        let mut schema = SchemaDefinition::new(
            "p",
            vec![
                NamedField::new("a", FieldDefinition::string()),
                NamedField::new("a", FieldDefinition::number()),
            ],
        );
        schema.primary_key = vec!["id".to_string()];

        let violation = validator().validate(&schema).unwrap_err();
        assert_eq!(violation.at("/fields/1"), ["duplicate field name 'a'".to_string()]);
        assert_eq!(violation.at("/primary_key/0"), ["unknown field 'id'".to_string()]);
    }

    #[test]
    fn test_skip_validation_accepts_anything() {
        let schema = SchemaDefinition::new("", Vec::new());
        assert!(SkipValidation.validate(&schema).is_ok());
    }
}
