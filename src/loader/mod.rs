//! Schema Loaders
//!
//! Entry points that fetch raw schemas from extension sources, bring them into
//! modern form, validate them and hand them to the construction engine:
//!
//! - [`SubschemaLoader`]: one extension's configuration schema, converted
//!   from the legacy format when needed and registered under a parent schema
//! - [`EntitySchemaLoader`]: one already-modern entity schema
//! - [`EntityBatchLoader`]: all entity schemas of an extension, in dependency
//!   order, stopping at the first failure

pub mod batch;
pub mod entity;
pub mod subschema;

pub use batch::EntityBatchLoader;
pub use entity::{EntitySchemaLoader, LoadEntity};
pub use subschema::{LoadedSubschema, SchemaOrigin, SubschemaLoader};
