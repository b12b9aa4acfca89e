//! Schema Loader CLI
//!
//! Converts legacy extension schemas, orders entity batches and runs the
//! loaders against an extensions directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use extension_schemas::{
    order_entities, DirectorySource, EntityBatchLoader, EntitySchemaFactory, EntitySchemaLoader,
    LegacyConverter, LoaderConfig, MetaSchemaValidator, ParentSchema, SchemaDefinition,
    SchemaValidator, SkipValidation, SubschemaLoader,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-loader")]
#[command(about = "Convert and load extension schemas")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the extensions directory
    #[arg(long, global = true)]
    extensions_dir: Option<PathBuf>,

    /// Skip meta-schema validation
    #[arg(long, global = true)]
    no_validate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a legacy schema file and print the modern schema
    Convert {
        /// Legacy schema (JSON)
        file: PathBuf,
        /// Schema name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the load order of a table of entity definitions
    Order {
        /// Entity definitions keyed by name (JSON)
        file: PathBuf,
    },

    /// Load an extension schema as a subschema and print it
    Subschema {
        extension: String,
        /// Parent schema name
        #[arg(short, long, default_value = "plugins")]
        parent: String,
    },

    /// Load the entity schemas an extension ships
    Entities { extension: String },

    /// List extensions in the extensions directory
    List,

    /// Write the effective configuration to a file
    Init {
        /// Output path
        #[arg(short, long, default_value = "schema-loader.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = LoaderConfig::load_from(cli.config.as_deref())?;
    if let Some(dir) = cli.extensions_dir {
        config.sources.extensions_dir = dir;
    }
    if cli.no_validate {
        config.validation.enabled = false;
    }

    let validator: Box<dyn SchemaValidator> = if config.validation.enabled {
        Box::new(MetaSchemaValidator::new()?)
    } else {
        Box::new(SkipValidation)
    };
    let converter = LegacyConverter::new().hook_policy(config.legacy.hook_policy);

    match cli.command {
        Commands::Convert { file, name } => {
            let raw = read_json(&file)?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("schema")
                    .to_string(),
            };
            let schema = converter.convert(&name, &raw)?;
            if let Err(violation) = validator.validate(&schema) {
                anyhow::bail!("converted schema is invalid: {}", violation);
            }
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }

        Commands::Order { file } => {
            let raw = read_json(&file)?;
            let named: BTreeMap<String, SchemaDefinition> = serde_json::from_value(raw)
                .with_context(|| format!("{} is not a table of entity definitions", file.display()))?;
            for (i, schema) in order_entities(named)?.iter().enumerate() {
                println!("{:>3}. {}", i + 1, schema.name);
            }
        }

        Commands::Subschema { extension, parent } => {
            let modules = DirectorySource::from_config(config.extensions_dir(), &config.sources);
            let fallback = config
                .fallback_dir()
                .map(|dir| DirectorySource::from_config(dir, &config.sources));

            let mut loader = SubschemaLoader::with_converter(&modules, validator.as_ref(), converter);
            if let Some(fallback) = &fallback {
                loader = loader.delegated(fallback);
            }

            let mut parent = ParentSchema::new(parent);
            let loaded = loader.load(&mut parent, &extension)?;
            eprintln!(
                "Loaded '{}' under '{}' ({:?}{})",
                extension,
                parent.name,
                loaded.origin,
                if loaded.legacy { ", converted from legacy" } else { "" }
            );
            println!("{}", serde_json::to_string_pretty(&loaded.definition)?);
        }

        Commands::Entities { extension } => {
            let source = DirectorySource::from_config(config.extensions_dir(), &config.sources);
            let loader = EntitySchemaLoader::new(validator.as_ref(), EntitySchemaFactory);
            let entities = EntityBatchLoader::new(&source).load(&extension, &loader)?;

            if entities.is_empty() {
                println!("No entities for {}", extension);
            }
            for (name, entity) in &entities {
                let references: Vec<_> = entity.references.iter().map(String::as_str).collect();
                println!(
                    "{} (primary key: {}; references: {})",
                    name,
                    entity.primary_key.join(", "),
                    if references.is_empty() { "-".to_string() } else { references.join(", ") }
                );
            }
        }

        Commands::List => {
            let source = DirectorySource::from_config(config.extensions_dir(), &config.sources);
            for extension in source.extensions() {
                println!("{}", extension);
            }
        }

        Commands::Init { output } => {
            config.save(&output)?;
            println!("Configuration written to {}", output);
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}
