//! Extension schema sources
//!
//! A source answers two questions for an extension: what is its schema, and
//! what entity definitions does it ship. Absence is a normal answer
//! (`Ok(None)`); errors are reserved for sources that exist but cannot be read.
//!
//! Directory layout used by [`DirectorySource`]:
//!
//! ```text
//! extensions/
//! ├── rate-limiting/
//! │   ├── schema.json
//! │   └── entities.json
//! └── key-auth/
//!     └── schema.json
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::SourceConfig;
use crate::error::SourceError;

/// Provider of raw extension schemas
pub trait SchemaSource {
    /// Raw schema of an extension, if it has one
    fn schema(&self, extension: &str) -> Result<Option<Value>, SourceError>;

    /// Raw entity definitions of an extension, if it has any
    fn entities(&self, _extension: &str) -> Result<Option<Value>, SourceError> {
        Ok(None)
    }
}

// =============================================================================
// In-memory Source
// =============================================================================

/// Source backed by maps, for embedded extensions and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    schemas: BTreeMap<String, Value>,
    entities: BTreeMap<String, Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, extension: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(extension.into(), schema);
        self
    }

    pub fn with_entities(mut self, extension: impl Into<String>, entities: Value) -> Self {
        self.entities.insert(extension.into(), entities);
        self
    }
}

impl SchemaSource for MemorySource {
    fn schema(&self, extension: &str) -> Result<Option<Value>, SourceError> {
        Ok(self.schemas.get(extension).cloned())
    }

    fn entities(&self, extension: &str) -> Result<Option<Value>, SourceError> {
        Ok(self.entities.get(extension).cloned())
    }
}

// =============================================================================
// Directory Source
// =============================================================================

/// Source reading `<root>/<extension>/<file>` JSON documents
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    schema_file: String,
    entities_file: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schema_file: "schema.json".to_string(),
            entities_file: "entities.json".to_string(),
        }
    }

    /// Build from the `[sources]` configuration, using `root` as the base directory
    pub fn from_config(root: impl Into<PathBuf>, config: &SourceConfig) -> Self {
        Self {
            root: root.into(),
            schema_file: config.schema_file.clone(),
            entities_file: config.entities_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the extension directories under the root, sorted
    pub fn extensions(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn read(&self, extension: &str, file: &str) -> Result<Option<Value>, SourceError> {
        check_extension_name(extension)?;
        let path = self.root.join(extension).join(file);
        if !path.is_file() {
            debug!(path = %path.display(), "no such extension file");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value = serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(value))
    }
}

/// An extension name must be a single plain path component
fn check_extension_name(extension: &str) -> Result<(), SourceError> {
    let mut components = Path::new(extension).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || extension.contains(['/', '\\']) {
        return Err(SourceError::InvalidExtensionName {
            name: extension.to_string(),
        });
    }
    Ok(())
}

impl SchemaSource for DirectorySource {
    fn schema(&self, extension: &str) -> Result<Option<Value>, SourceError> {
        self.read(extension, &self.schema_file)
    }

    fn entities(&self, extension: &str) -> Result<Option<Value>, SourceError> {
        self.read(extension, &self.entities_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new()
            .with_schema("acl", json!({ "fields": {} }))
            .with_entities("acl", json!([]));
        assert!(source.schema("acl").unwrap().is_some());
        assert!(source.entities("acl").unwrap().is_some());
        assert!(source.schema("nope").unwrap().is_none());
        assert!(source.entities("nope").unwrap().is_none());
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("acl")).unwrap();
        fs::create_dir_all(dir.path().join("broken")).unwrap();
        fs::write(dir.path().join("acl/schema.json"), r#"{ "fields": {} }"#).unwrap();
        fs::write(dir.path().join("broken/schema.json"), "{ nope").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.extensions(), vec!["acl", "broken"]);
        assert_eq!(source.schema("acl").unwrap(), Some(json!({ "fields": {} })));
        assert!(source.entities("acl").unwrap().is_none());
        assert!(source.schema("missing").unwrap().is_none());
        assert!(matches!(source.schema("broken"), Err(SourceError::Json { .. })));
    }

    #[test]
    fn test_extension_names_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("extensions");
        fs::create_dir_all(root.join("acl")).unwrap();
        fs::write(root.join("acl/schema.json"), r#"{ "fields": {} }"#).unwrap();
        fs::create_dir_all(dir.path().join("outside")).unwrap();
        fs::write(dir.path().join("outside/schema.json"), r#"{ "fields": {} }"#).unwrap();

        let source = DirectorySource::new(&root);
        assert!(source.schema("acl").unwrap().is_some());
        for name in ["../outside", "..", ".", "", "acl/../acl", "a\\b", "/etc"] {
            assert!(
                matches!(source.schema(name), Err(SourceError::InvalidExtensionName { .. })),
                "accepted {:?}",
                name
            );
            assert!(matches!(source.entities(name), Err(SourceError::InvalidExtensionName { .. })));
        }
    }
}
