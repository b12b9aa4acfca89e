//! Subschema loading

use serde_json::Value;
use tracing::{debug, info};

use crate::engine::SubschemaHost;
use crate::error::{LoadError, Origin, Result};
use crate::legacy::{is_legacy, LegacyConverter};
use crate::schema::SchemaDefinition;
use crate::source::SchemaSource;
use crate::typedefs::{CanonicalFields, StandardTypedefs};
use crate::validate::SchemaValidator;

/// Which source supplied a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// The extension's own module
    Module,
    /// The delegated (out-of-process) source
    Delegated,
}

/// A subschema that has been validated and registered
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSubschema {
    pub definition: SchemaDefinition,
    /// Whether the raw schema was in the legacy format
    pub legacy: bool,
    pub origin: SchemaOrigin,
}

/// Loads extension schemas as subschemas of a parent schema
pub struct SubschemaLoader<'a, T = StandardTypedefs> {
    modules: &'a dyn SchemaSource,
    delegated: Option<&'a dyn SchemaSource>,
    validator: &'a dyn SchemaValidator,
    converter: LegacyConverter<T>,
}

impl<'a> SubschemaLoader<'a, StandardTypedefs> {
    pub fn new(modules: &'a dyn SchemaSource, validator: &'a dyn SchemaValidator) -> Self {
        Self::with_converter(modules, validator, LegacyConverter::new())
    }
}

impl<'a, T: CanonicalFields> SubschemaLoader<'a, T> {
    pub fn with_converter(
        modules: &'a dyn SchemaSource,
        validator: &'a dyn SchemaValidator,
        converter: LegacyConverter<T>,
    ) -> Self {
        Self {
            modules,
            delegated: None,
            validator,
            converter,
        }
    }

    /// Source consulted when the module source has no schema
    pub fn delegated(mut self, source: &'a dyn SchemaSource) -> Self {
        self.delegated = Some(source);
        self
    }

    /// Load the schema of `extension` and register it under `parent`
    pub fn load<H>(&self, parent: &mut H, extension: &str) -> Result<LoadedSubschema>
    where
        H: SubschemaHost + ?Sized,
    {
        let (raw, origin) = self.fetch(extension)?;
        let legacy = is_legacy(&raw);

        let definition = if legacy {
            debug!(extension, "converting legacy schema");
            self.converter
                .convert(extension, &raw)
                .map_err(|source| LoadError::Conversion {
                    extension: extension.to_string(),
                    source,
                })?
        } else {
            serde_json::from_value(raw).map_err(|e| LoadError::MalformedDefinition {
                origin: Origin::extension(extension),
                reason: e.to_string(),
            })?
        };

        self.validator
            .validate(&definition)
            .map_err(|violation| LoadError::SchemaValidation {
                origin: Origin::extension(extension),
                violation,
            })?;

        parent
            .new_subschema(extension, &definition)
            .map_err(|source| LoadError::EntityInit {
                origin: Origin::extension(extension),
                source,
            })?;

        info!(extension, legacy, ?origin, "loaded subschema");
        Ok(LoadedSubschema {
            definition,
            legacy,
            origin,
        })
    }

    fn fetch(&self, extension: &str) -> Result<(Value, SchemaOrigin)> {
        let source_error = |source| LoadError::Source {
            extension: extension.to_string(),
            source,
        };

        if let Some(raw) = self.modules.schema(extension).map_err(source_error)? {
            return Ok((raw, SchemaOrigin::Module));
        }
        if let Some(delegated) = self.delegated {
            if let Some(raw) = delegated.schema(extension).map_err(source_error)? {
                return Ok((raw, SchemaOrigin::Delegated));
            }
        }
        Err(LoadError::SchemaNotFound {
            extension: extension.to_string(),
        })
    }
}
