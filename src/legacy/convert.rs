//! Legacy to modern schema conversion
//!
//! Every translated field ends up inside a single required `config` record.
//! Translation per legacy type:
//!
//! | legacy      | modern                                               |
//! |-------------|------------------------------------------------------|
//! | `url`       | `string` + `url` custom validator                    |
//! | `table`     | `record` (required), or `map<string, record>` if flexible |
//! | `array`     | `array` of `string` (or of `record` with a schema)   |
//! | `timestamp` | canonical timestamp definition                       |
//! | `string`    | `string` with `len_min = 0`                          |
//! | `number`, `boolean` | unchanged                                    |
//!
//! The conversion is lossy in two places: `immutable` is dropped, and `func`
//! hooks (arbitrary legacy validation code) have no modern counterpart. Under
//! [`HookPolicy::Drop`] a field's hook is discarded with a warning and the
//! converted schema no longer enforces it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{LegacyField, LegacySchema, LegacyType};
use crate::error::ConversionError;
use crate::schema::{CustomValidator, FieldDefinition, FieldType, NamedField, SchemaDefinition};
use crate::typedefs::{CanonicalFields, StandardTypedefs};

/// What to do with a legacy `func` validation hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPolicy {
    /// Discard the hook and log a warning
    #[default]
    Drop,
    /// Fail the conversion
    Reject,
}

/// Converts legacy schemas using a canonical field library
#[derive(Debug, Clone)]
pub struct LegacyConverter<T = StandardTypedefs> {
    typedefs: T,
    hook_policy: HookPolicy,
}

impl Default for LegacyConverter<StandardTypedefs> {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyConverter<StandardTypedefs> {
    pub fn new() -> Self {
        Self::with_typedefs(StandardTypedefs)
    }
}

impl<T: CanonicalFields> LegacyConverter<T> {
    pub fn with_typedefs(typedefs: T) -> Self {
        Self {
            typedefs,
            hook_policy: HookPolicy::default(),
        }
    }

    pub fn hook_policy(mut self, policy: HookPolicy) -> Self {
        self.hook_policy = policy;
        self
    }

    /// Convert an untyped legacy schema into a modern schema called `name`
    pub fn convert(&self, name: &str, legacy_root: &Value) -> Result<SchemaDefinition, ConversionError> {
        let legacy = LegacySchema::from_value(legacy_root)?;
        self.convert_schema(name, &legacy)
    }

    /// Convert an already parsed legacy schema
    pub fn convert_schema(&self, name: &str, legacy: &LegacySchema) -> Result<SchemaDefinition, ConversionError> {
        let config = FieldDefinition::record(self.convert_fields(&legacy.fields)?).with_required(true);

        let mut fields = vec![NamedField::new("config", config)];
        fields.extend(legacy.markers.iter().map(|m| self.typedefs.marker(*m)));

        Ok(SchemaDefinition {
            name: name.to_string(),
            primary_key: Vec::new(),
            fields,
            entity_checks: legacy.entity_checks.clone(),
        })
    }

    fn convert_fields(&self, fields: &[LegacyField]) -> Result<Vec<NamedField>, ConversionError> {
        fields.iter().map(|field| self.convert_field(field)).collect()
    }

    fn convert_field(&self, field: &LegacyField) -> Result<NamedField, ConversionError> {
        if let Some(definition) = &field.new_type {
            return Ok(NamedField::new(field.name.clone(), definition.clone()));
        }

        if field.immutable {
            debug!(field = %field.path, "ignoring 'immutable' attribute");
        }
        if field.has_hook {
            match self.hook_policy {
                HookPolicy::Drop => {
                    warn!(field = %field.path, "dropping legacy 'func' hook; its checks are not carried over")
                }
                HookPolicy::Reject => {
                    return Err(ConversionError::UnsupportedLegacyHook { field: field.path.clone() })
                }
            }
        }

        let mut definition = match field.ty {
            Some(LegacyType::Url) => {
                let mut definition = FieldDefinition::string();
                definition.custom_validator = Some(CustomValidator::Url);
                definition
            }
            Some(LegacyType::Table) => self.convert_table(field)?,
            Some(LegacyType::Array) => self.convert_array(field)?,
            Some(LegacyType::Timestamp) => self.typedefs.timestamp(),
            Some(LegacyType::String) => FieldDefinition::new(FieldType::String { len_min: Some(0) }),
            Some(LegacyType::Number) => FieldDefinition::number(),
            Some(LegacyType::Boolean) => FieldDefinition::boolean(),
            None => FieldDefinition::string(),
        };

        if field.schema.is_some() && !matches!(field.ty, Some(LegacyType::Table | LegacyType::Array)) {
            warn!(field = %field.path, "ignoring nested schema on a field that is neither table nor array");
        }

        if field.ty != Some(LegacyType::Array) {
            if let Some(allowed) = &field.allowed {
                definition.one_of = Some(allowed.clone());
            }
        }
        if let Some(default) = &field.default {
            definition.default = Some(default.clone());
        }
        if let Some(required) = field.required {
            definition.required = Some(required);
        }
        if let Some(unique) = field.unique {
            definition.unique = Some(unique);
        }

        Ok(NamedField::new(field.name.clone(), definition))
    }

    fn convert_table(&self, field: &LegacyField) -> Result<FieldDefinition, ConversionError> {
        // Without a nested schema there is no shape to derive; the field
        // stays required like any other non-flexible table
        let Some(schema) = &field.schema else {
            let map = FieldDefinition::map(FieldDefinition::string(), FieldDefinition::string());
            return Ok(map.with_required(true));
        };
        let fields = self.convert_fields(&schema.fields)?;

        if schema.flexible {
            return Ok(FieldDefinition::map(
                FieldDefinition::string(),
                FieldDefinition::record(fields).with_required(true),
            ));
        }

        let defaults: Map<String, Value> = fields
            .iter()
            .filter_map(|f| f.definition.default.clone().map(|d| (f.name.clone(), d)))
            .collect();

        let mut record = FieldDefinition::record(fields).with_required(true);
        if !defaults.is_empty() {
            record.default = Some(Value::Object(defaults));
        }
        Ok(record)
    }

    fn convert_array(&self, field: &LegacyField) -> Result<FieldDefinition, ConversionError> {
        let mut elements = match &field.schema {
            Some(schema) => FieldDefinition::record(self.convert_fields(&schema.fields)?),
            None => FieldDefinition::string(),
        };
        elements.one_of = field.allowed.clone();
        Ok(FieldDefinition::array(elements))
    }
}

/// Convert with the standard field library and the default hook policy
pub fn convert_legacy_schema(name: &str, legacy_root: &Value) -> Result<SchemaDefinition, ConversionError> {
    LegacyConverter::new().convert(name, legacy_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_field<'a>(schema: &'a SchemaDefinition, name: &str) -> &'a FieldDefinition {
        let config = schema.field("config").expect("config record");
        &config
            .fields()
            .expect("config is a record")
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no field {}", name))
            .definition
    }

    #[test]
    fn test_wraps_fields_in_required_config() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "a": { "type": "number" },
            "b": { "type": "boolean", "default": true }
        }}))
        .unwrap();

        assert_eq!(schema.name, "p");
        assert_eq!(schema.fields.len(), 1);
        let config = schema.field("config").unwrap();
        assert_eq!(config.required, Some(true));
        let names: Vec<_> = config.fields().unwrap().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(config_field(&schema, "b").default, Some(json!(true)));
    }

    #[test]
    fn test_url_field() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "endpoint": { "type": "url", "required": true }
        }}))
        .unwrap();

        let endpoint = config_field(&schema, "endpoint");
        assert_eq!(endpoint.kind, FieldType::String { len_min: None });
        assert_eq!(endpoint.required, Some(true));
        let validator = endpoint.custom_validator.expect("url validator");
        assert!(validator.check(&json!("http://example.com")).is_ok());
        assert!(validator.check(&json!("not-a-url")).is_err());
    }

    #[test]
    fn test_string_gets_min_length_and_enum() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "policy": { "type": "string", "enum": ["local", "cluster"], "unique": true }
        }}))
        .unwrap();

        let policy = config_field(&schema, "policy");
        assert_eq!(policy.kind, FieldType::String { len_min: Some(0) });
        assert_eq!(policy.one_of, Some(vec![json!("local"), json!("cluster")]));
        assert_eq!(policy.unique, Some(true));
    }

    #[test]
    fn test_untyped_field_defaults_to_string() {
        let schema = convert_legacy_schema("p", &json!({ "fields": { "x": { "default": "y" } } })).unwrap();
        assert_eq!(config_field(&schema, "x").kind, FieldType::String { len_min: None });
    }

    #[test]
    fn test_array_enum_goes_to_elements() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "methods": { "type": "array", "enum": ["GET", "POST"] }
        }}))
        .unwrap();

        let methods = config_field(&schema, "methods");
        assert_eq!(methods.one_of, None);
        match &methods.kind {
            FieldType::Array { elements } => {
                assert!(matches!(elements.kind, FieldType::String { .. }));
                assert_eq!(elements.one_of, Some(vec![json!("GET"), json!("POST")]));
            }
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_array_with_schema_has_record_elements() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "rules": { "type": "array", "schema": { "fields": { "path": { "type": "string" } } } }
        }}))
        .unwrap();

        match &config_field(&schema, "rules").kind {
            FieldType::Array { elements } => {
                assert_eq!(elements.fields().unwrap()[0].name, "path");
            }
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_table_without_schema_is_generic_map() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "headers": { "type": "table" },
            "extra": { "type": "table", "required": false }
        }}))
        .unwrap();

        let headers = config_field(&schema, "headers");
        assert_eq!(
            headers.kind,
            FieldType::Map {
                keys: Box::new(FieldDefinition::string()),
                values: Box::new(FieldDefinition::string()),
            }
        );
        assert_eq!(headers.required, Some(true));
        assert_eq!(config_field(&schema, "extra").required, Some(false));
    }

    #[test]
    fn test_record_required_can_be_disabled() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "on": { "type": "table", "schema": { "fields": { "x": { "type": "number" } } } },
            "off": { "type": "table", "required": false, "schema": { "fields": { "x": { "type": "number" } } } }
        }}))
        .unwrap();

        assert_eq!(config_field(&schema, "on").required, Some(true));
        assert_eq!(config_field(&schema, "off").required, Some(false));
    }

    #[test]
    fn test_explicit_table_default_wins() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "t": { "type": "table", "default": { "x": 5 }, "schema": { "fields": {
                "x": { "type": "number", "default": 1 }
            }}}
        }}))
        .unwrap();
        assert_eq!(config_field(&schema, "t").default, Some(json!({ "x": 5 })));
    }

    #[test]
    fn test_timestamp_uses_canonical_definition() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "created_at": { "type": "timestamp", "immutable": true }
        }}))
        .unwrap();
        assert_eq!(config_field(&schema, "created_at"), &StandardTypedefs.timestamp());
    }

    #[test]
    fn test_new_type_is_copied_as_is() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "port": { "new_type": { "type": "number", "default": 80, "required": true } }
        }}))
        .unwrap();
        let port = config_field(&schema, "port");
        assert_eq!(port.kind, FieldType::Number { timestamp: false });
        assert_eq!(port.default, Some(json!(80)));
        assert_eq!(port.required, Some(true));
    }

    #[test]
    fn test_new_type_bypasses_legacy_attributes() {
        let schema = convert_legacy_schema("p", &json!({ "fields": {
            "port": { "type": "integer", "required": "yes", "new_type": { "type": "number" } },
            "limits": {
                "type": "table",
                "schema": { "fields": "not a table" },
                "new_type": { "type": "map", "keys": { "type": "string" }, "values": { "type": "number" } }
            }
        }}))
        .unwrap();

        assert_eq!(config_field(&schema, "port"), &FieldDefinition::number());
        assert!(matches!(config_field(&schema, "limits").kind, FieldType::Map { .. }));
    }

    #[test]
    fn test_markers_and_entity_checks() {
        let checks = json!([{ "at_least_one_of": ["config.a", "config.b"] }]);
        let schema = convert_legacy_schema("p", &json!({
            "no_route": true,
            "no_service": false,
            "no_consumer": true,
            "entity_checks": checks,
            "fields": {}
        }))
        .unwrap();

        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["config", "route", "consumer"]);
        assert_eq!(schema.entity_checks, Some(checks));
    }

    #[test]
    fn test_hook_policy() {
        let legacy = json!({ "fields": { "key": { "type": "string", "func": "check_key" } } });

        let schema = LegacyConverter::new().convert("p", &legacy).unwrap();
        assert_eq!(config_field(&schema, "key").custom_validator, None);

        let err = LegacyConverter::new()
            .hook_policy(HookPolicy::Reject)
            .convert("p", &legacy)
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedLegacyHook { field } if field == "key"));
    }
}
