//! Configuration management for the schema loader
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-loader.toml)
//! - Environment variables (SCHEMA_LOADER__*)
//!
//! ## Example config file (schema-loader.toml):
//! ```toml
//! [legacy]
//! hook_policy = "drop"
//!
//! [sources]
//! extensions_dir = "./extensions"
//! fallback_dir = "./remote-extensions"
//! schema_file = "schema.json"
//! entities_file = "entities.json"
//!
//! [validation]
//! enabled = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::legacy::HookPolicy;

/// Main configuration for the loader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Legacy conversion settings
    #[serde(default)]
    pub legacy: LegacyConfig,

    /// Where extension schemas are read from
    #[serde(default)]
    pub sources: SourceConfig,

    /// Meta-schema validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Legacy conversion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Treatment of legacy `func` hooks
    #[serde(default)]
    pub hook_policy: HookPolicy,
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one sub-directory per extension
    #[serde(default = "default_extensions_dir")]
    pub extensions_dir: PathBuf,

    /// Directory consulted when an extension has no local schema
    #[serde(default)]
    pub fallback_dir: Option<PathBuf>,

    /// Schema file name inside an extension directory
    #[serde(default = "default_schema_file")]
    pub schema_file: String,

    /// Entity definitions file name inside an extension directory
    #[serde(default = "default_entities_file")]
    pub entities_file: String,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Check schemas against the meta-schema before registering them
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_extensions_dir() -> PathBuf {
    PathBuf::from("extensions")
}

fn default_schema_file() -> String {
    "schema.json".to_string()
}

fn default_entities_file() -> String {
    "entities.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extensions_dir: default_extensions_dir(),
            fallback_dir: None,
            schema_file: default_schema_file(),
            entities_file: default_entities_file(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl LoaderConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-loader.toml",
            ".schema-loader.toml",
            "config/schema-loader.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-loader") {
            let xdg_config = config_dir.config_dir().join("schema-loader.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SCHEMA_LOADER__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_LOADER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Extensions directory, resolved against the current directory
    pub fn extensions_dir(&self) -> PathBuf {
        resolve(&self.sources.extensions_dir)
    }

    /// Fallback directory, resolved against the current directory
    pub fn fallback_dir(&self) -> Option<PathBuf> {
        self.sources.fallback_dir.as_deref().map(resolve)
    }
}

fn resolve(path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
