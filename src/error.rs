//! Error types for schema conversion and loading

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while reading or translating a legacy schema
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unknown legacy field type '{type_name}' on field '{field}'")]
    UnknownLegacyFieldType { field: String, type_name: String },

    #[error("unknown legacy field attribute '{attribute}' on field '{field}'")]
    UnknownLegacyFieldAttribute { field: String, attribute: String },

    #[error("invalid legacy attribute '{attribute}' on field '{field}': expected {expected}")]
    InvalidLegacyAttribute {
        field: String,
        attribute: &'static str,
        expected: &'static str,
    },

    #[error("malformed legacy schema at '{path}': {reason}")]
    MalformedLegacySchema { path: String, reason: String },

    #[error("legacy field '{field}' declares a custom validation hook, which cannot be translated")]
    UnsupportedLegacyHook { field: String },

    #[error("invalid new_type definition on field '{field}': {source}")]
    InvalidNewType {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by an extension schema source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{name}' is not a valid extension name")]
    InvalidExtensionName { name: String },
}

/// Errors raised by the entity-construction engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("subschema '{name}' is already registered under '{parent}'")]
    DuplicateSubschema { parent: String, name: String },

    #[error("primary key field '{field}' is not declared")]
    UnknownPrimaryKey { field: String },

    #[error("{0}")]
    Rejected(String),
}

/// Structured description of a meta-schema violation
///
/// Keys are JSON pointers into the serialized definition (or `@schema` for
/// the document root); values are the messages reported at that location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaViolation {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl SchemaViolation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        let path = if path.is_empty() { "@schema".to_string() } else { path };
        self.errors.entry(path).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages reported at one location
    pub fn at(&self, path: &str) -> &[String] {
        self.errors.get(path).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", path, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Which schema a load failure belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub extension: String,
    pub entity: Option<String>,
}

impl Origin {
    pub fn extension(extension: impl Into<String>) -> Self {
        Self { extension: extension.into(), entity: None }
    }

    pub fn entity(extension: impl Into<String>, entity: impl Into<String>) -> Self {
        Self { extension: extension.into(), entity: Some(entity.into()) }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "entity '{}' of extension '{}'", entity, self.extension),
            None => write!(f, "extension '{}'", self.extension),
        }
    }
}

/// Loader errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no schema found for extension '{extension}'")]
    SchemaNotFound { extension: String },

    #[error("extension '{extension}': {source}")]
    Conversion {
        extension: String,
        #[source]
        source: ConversionError,
    },

    #[error("schema of {origin} is invalid: {violation}")]
    SchemaValidation { origin: Origin, violation: SchemaViolation },

    #[error("failed to initialize {origin}: {source}")]
    EntityInit {
        origin: Origin,
        #[source]
        source: EngineError,
    },

    #[error("extension '{extension}' has cyclic entity dependencies between {}", .entities.join(", "))]
    CyclicEntityDependency { extension: String, entities: Vec<String> },

    #[error("malformed definition in {origin}: {reason}")]
    MalformedDefinition { origin: Origin, reason: String },

    #[error("extension '{extension}': {source}")]
    Source {
        extension: String,
        #[source]
        source: SourceError,
    },
}
