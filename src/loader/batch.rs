//! Entity batch loading
//!
//! Entity definitions come either as an ordered array (modern) or as a table
//! keyed by entity name (legacy). Only the legacy shape is reordered; an
//! array is trusted to already be in load order.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::entity::LoadEntity;
use crate::error::{LoadError, Origin, Result};
use crate::graph::order_entities;
use crate::schema::SchemaDefinition;
use crate::source::SchemaSource;

/// Loads every entity schema an extension ships
pub struct EntityBatchLoader<'a> {
    source: &'a dyn SchemaSource,
}

impl<'a> EntityBatchLoader<'a> {
    pub fn new(source: &'a dyn SchemaSource) -> Self {
        Self { source }
    }

    /// Load all entities of `extension`; the first failure aborts the batch
    pub fn load<L>(&self, extension: &str, loader: &L) -> Result<BTreeMap<String, L::Entity>>
    where
        L: LoadEntity + ?Sized,
    {
        let raw = self
            .source
            .entities(extension)
            .map_err(|source| LoadError::Source {
                extension: extension.to_string(),
                source,
            })?;

        let Some(raw) = raw else {
            debug!(extension, "extension ships no entities");
            return Ok(BTreeMap::new());
        };

        let ordered = resolve_order(extension, raw)?;
        let mut entities = BTreeMap::new();
        for definition in ordered {
            let entity = loader.load_entity(extension, &definition)?;
            entities.insert(definition.name, entity);
        }

        info!(extension, count = entities.len(), "loaded entity schemas");
        Ok(entities)
    }
}

/// Parse raw entity definitions into load order
pub fn resolve_order(extension: &str, raw: Value) -> Result<Vec<SchemaDefinition>> {
    match raw {
        Value::Array(items) => {
            let definitions = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| parse_definition(extension, &format!("#{}", i), item))
                .collect::<Result<Vec<_>>>()?;

            let mut names = std::collections::HashSet::with_capacity(definitions.len());
            for definition in &definitions {
                if !names.insert(definition.name.as_str()) {
                    return Err(LoadError::MalformedDefinition {
                        origin: Origin::entity(extension, &definition.name),
                        reason: "entity is defined more than once".to_string(),
                    });
                }
            }
            Ok(definitions)
        }
        Value::Object(table) => {
            let named = table
                .into_iter()
                .map(|(key, item)| {
                    let definition = parse_definition(extension, &key, item)?;
                    if definition.name != key {
                        return Err(LoadError::MalformedDefinition {
                            origin: Origin::entity(extension, &key),
                            reason: format!("entity is keyed as '{}' but named '{}'", key, definition.name),
                        });
                    }
                    Ok((key, definition))
                })
                .collect::<Result<BTreeMap<_, _>>>()?;

            let ordered = order_entities(named).map_err(|cycle| LoadError::CyclicEntityDependency {
                extension: extension.to_string(),
                entities: cycle.entities,
            })?;
            debug!(
                extension,
                order = ?ordered.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
                "resolved entity load order"
            );
            Ok(ordered)
        }
        other => Err(LoadError::MalformedDefinition {
            origin: Origin::extension(extension),
            reason: format!("entity definitions must be an array or a table, got {}", json_kind(&other)),
        }),
    }
}

fn parse_definition(extension: &str, label: &str, item: Value) -> Result<SchemaDefinition> {
    serde_json::from_value(item).map_err(|e| LoadError::MalformedDefinition {
        origin: Origin::entity(extension, label),
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
