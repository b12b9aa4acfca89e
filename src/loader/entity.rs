//! Entity schema loading

use tracing::debug;

use crate::engine::EntityFactory;
use crate::error::{LoadError, Origin, Result};
use crate::schema::SchemaDefinition;
use crate::validate::SchemaValidator;

/// Anything that can load one entity definition of an extension
///
/// Implemented by [`EntitySchemaLoader`] and by plain closures, so batch
/// loading can be driven with a custom loader.
pub trait LoadEntity {
    type Entity;

    fn load_entity(&self, extension: &str, definition: &SchemaDefinition) -> Result<Self::Entity>;
}

impl<F, E> LoadEntity for F
where
    F: Fn(&str, &SchemaDefinition) -> Result<E>,
{
    type Entity = E;

    fn load_entity(&self, extension: &str, definition: &SchemaDefinition) -> Result<E> {
        self(extension, definition)
    }
}

/// Validates a modern entity definition and builds its entity schema
pub struct EntitySchemaLoader<'a, F> {
    validator: &'a dyn SchemaValidator,
    factory: F,
}

impl<'a, F: EntityFactory> EntitySchemaLoader<'a, F> {
    pub fn new(validator: &'a dyn SchemaValidator, factory: F) -> Self {
        Self { validator, factory }
    }

    pub fn load(&self, extension: &str, definition: &SchemaDefinition) -> Result<F::Entity> {
        self.validator
            .validate(definition)
            .map_err(|violation| LoadError::SchemaValidation {
                origin: Origin::entity(extension, &definition.name),
                violation,
            })?;

        let entity = self
            .factory
            .new_entity(definition)
            .map_err(|source| LoadError::EntityInit {
                origin: Origin::entity(extension, &definition.name),
                source,
            })?;

        debug!(extension, entity = %definition.name, "loaded entity schema");
        Ok(entity)
    }
}

impl<'a, F: EntityFactory> LoadEntity for EntitySchemaLoader<'a, F> {
    type Entity = F::Entity;

    fn load_entity(&self, extension: &str, definition: &SchemaDefinition) -> Result<F::Entity> {
        self.load(extension, definition)
    }
}
