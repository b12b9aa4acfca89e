//! Extension Schemas
//!
//! Brings extension-supplied schemas into modern, strongly-typed form and
//! loads them in a dependency-respecting order.
//!
//! ## Features
//!
//! - **Legacy Conversion**: Untyped legacy field descriptors become typed
//!   [`SchemaDefinition`]s wrapped in a single `config` record
//! - **Dependency Ordering**: Entity batches are ordered so referenced
//!   entities load first; cycles are reported, not looped on
//! - **Validation**: Definitions are checked against an embedded meta-schema
//!   before registration
//! - **Pluggable Collaborators**: Schema sources, validators and the
//!   construction engine are traits
//!
//! ## Architecture
//!
//! ```text
//! SchemaSource ──▶ SubschemaLoader ──▶ LegacyConverter ──┐
//!      │                                                  ├──▶ SchemaValidator ──▶ SubschemaHost
//!      └────────▶ EntityBatchLoader ──▶ EntityGraph ──────┘                    └──▶ EntityFactory
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod legacy;
pub mod loader;
pub mod schema;
pub mod source;
pub mod typedefs;
pub mod url;
pub mod validate;

pub use config::LoaderConfig;
pub use engine::{EntityFactory, EntitySchema, EntitySchemaFactory, ParentSchema, SubschemaHost};
pub use error::{ConversionError, EngineError, LoadError, Origin, Result, SchemaViolation, SourceError};
pub use graph::{order_entities, DependencyCycle, EntityGraph, EntityNode};
pub use legacy::{convert_legacy_schema, HookPolicy, LegacyConverter};
pub use loader::{EntityBatchLoader, EntitySchemaLoader, LoadEntity, LoadedSubschema, SchemaOrigin, SubschemaLoader};
pub use schema::{CustomValidator, FieldDefinition, FieldType, NamedField, SchemaDefinition};
pub use source::{DirectorySource, MemorySource, SchemaSource};
pub use typedefs::{CanonicalFields, Marker, StandardTypedefs};
pub use validate::{MetaSchemaValidator, SchemaValidator, SkipValidation};
