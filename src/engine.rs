//! Entity Construction
//!
//! The loaders hand validated definitions to two collaborators: a
//! [`SubschemaHost`] that registers named variants under a parent schema, and
//! an [`EntityFactory`] that turns a standalone definition into an entity
//! schema object. [`ParentSchema`] and [`EntitySchemaFactory`] are the stock
//! implementations.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::EngineError;
use crate::schema::SchemaDefinition;

/// Parent schema that accepts named subschemas
pub trait SubschemaHost {
    fn new_subschema(&mut self, name: &str, definition: &SchemaDefinition) -> Result<(), EngineError>;
}

/// Builder of entity schema objects
pub trait EntityFactory {
    type Entity;

    fn new_entity(&self, definition: &SchemaDefinition) -> Result<Self::Entity, EngineError>;
}

// =============================================================================
// Parent Schema
// =============================================================================

/// A generic schema whose configuration shape varies per extension
#[derive(Debug, Clone)]
pub struct ParentSchema {
    pub name: String,
    subschemas: BTreeMap<String, SchemaDefinition>,
}

impl ParentSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subschemas: BTreeMap::new(),
        }
    }

    pub fn subschema(&self, name: &str) -> Option<&SchemaDefinition> {
        self.subschemas.get(name)
    }

    pub fn subschema_names(&self) -> impl Iterator<Item = &str> {
        self.subschemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.subschemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subschemas.is_empty()
    }
}

impl SubschemaHost for ParentSchema {
    fn new_subschema(&mut self, name: &str, definition: &SchemaDefinition) -> Result<(), EngineError> {
        if self.subschemas.contains_key(name) {
            return Err(EngineError::DuplicateSubschema {
                parent: self.name.clone(),
                name: name.to_string(),
            });
        }
        debug!(parent = %self.name, subschema = name, "registered subschema");
        self.subschemas.insert(name.to_string(), definition.clone());
        Ok(())
    }
}

// =============================================================================
// Entity Schema
// =============================================================================

/// A persistable entity type contributed by an extension
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    pub name: String,
    pub primary_key: Vec<String>,
    /// Entities this one references through foreign fields
    pub references: BTreeSet<String>,
    pub definition: SchemaDefinition,
}

/// Builds [`EntitySchema`]s, defaulting the primary key to `id`
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySchemaFactory;

impl EntityFactory for EntitySchemaFactory {
    type Entity = EntitySchema;

    fn new_entity(&self, definition: &SchemaDefinition) -> Result<EntitySchema, EngineError> {
        let primary_key = if definition.primary_key.is_empty() {
            vec!["id".to_string()]
        } else {
            definition.primary_key.clone()
        };

        for field in &primary_key {
            if definition.field(field).is_none() {
                return Err(EngineError::UnknownPrimaryKey { field: field.clone() });
            }
        }

        Ok(EntitySchema {
            name: definition.name.clone(),
            primary_key,
            references: definition
                .foreign_references()
                .into_iter()
                .map(str::to_string)
                .collect(),
            definition: definition.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, NamedField};

    #[test]
    fn test_subschema_name_collision() {
        let mut parent = ParentSchema::new("plugins");
        let definition = SchemaDefinition::new("acl", Vec::new());
        parent.new_subschema("acl", &definition).unwrap();
        assert_eq!(parent.len(), 1);

        let err = parent.new_subschema("acl", &definition).unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateSubschema { parent: "plugins".into(), name: "acl".into() }
        );
    }

    #[test]
    fn test_entity_primary_key() {
        let definition = SchemaDefinition::new(
            "credentials",
            vec![
                NamedField::new("id", FieldDefinition::string()),
                NamedField::new("consumer", FieldDefinition::foreign("consumers")),
            ],
        );
        let entity = EntitySchemaFactory.new_entity(&definition).unwrap();
        assert_eq!(entity.primary_key, vec!["id"]);
        assert!(entity.references.contains("consumers"));

        let keyless = SchemaDefinition::new("keyless", Vec::new());
        assert_eq!(
            EntitySchemaFactory.new_entity(&keyless).unwrap_err(),
            EngineError::UnknownPrimaryKey { field: "id".into() }
        );
    }
}
