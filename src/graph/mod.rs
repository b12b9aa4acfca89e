//! Entity Dependency Graph
//!
//! Orders one extension's entity schemas so that every entity comes after the
//! entities it references through `foreign` fields.
//!
//! The baseline order is the entity names sorted in descending order. A
//! depth-first walk over that baseline emits each entity after its
//! dependencies, so entities with no relative constraint keep their baseline
//! position. References to entities outside the batch are ignored, as are
//! self-references. Cycles are reported as [`DependencyCycle`].

pub mod analysis;

pub use analysis::{find_cycles, DependencyCycle};

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::schema::SchemaDefinition;

/// An entity schema together with the in-batch entities it depends on
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub name: String,
    pub definition: SchemaDefinition,
    /// Names of every entity referenced by a foreign field
    pub references: BTreeSet<String>,
}

impl EntityNode {
    pub fn new(name: impl Into<String>, definition: SchemaDefinition) -> Self {
        let references = definition
            .foreign_references()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            name: name.into(),
            definition,
            references,
        }
    }
}

/// Dependency graph; edges run from a dependent entity to its dependency
pub struct EntityGraph {
    pub(crate) graph: DiGraph<EntityNode, ()>,
}

impl EntityGraph {
    /// Build the graph; node indices follow the baseline order
    pub fn build(schemas: BTreeMap<String, SchemaDefinition>) -> Self {
        let mut graph = DiGraph::with_capacity(schemas.len(), schemas.len());
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::with_capacity(schemas.len());

        // BTreeMap iterates ascending; the baseline is descending
        for (name, definition) in schemas.into_iter().rev() {
            let idx = graph.add_node(EntityNode::new(name.clone(), definition));
            node_indices.insert(name, idx);
        }

        let mut edges = Vec::new();
        for idx in graph.node_indices() {
            let node = &graph[idx];
            for reference in &node.references {
                if reference == &node.name {
                    continue;
                }
                match node_indices.get(reference) {
                    Some(&target) => edges.push((idx, target)),
                    None => debug!(entity = %node.name, reference = %reference, "ignoring reference outside batch"),
                }
            }
        }
        for (from, to) in edges {
            graph.update_edge(from, to, ());
        }

        Self { graph }
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Names of the in-batch dependencies of an entity, in baseline order
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.graph.node_indices().find(|&i| self.graph[i].name == name) else {
            return Vec::new();
        };
        self.sorted_neighbors(idx)
            .into_iter()
            .map(|i| self.graph[i].name.as_str())
            .collect()
    }

    /// Consume the graph, producing definitions in load order
    pub fn into_load_order(self) -> Result<Vec<SchemaDefinition>, DependencyCycle> {
        let cycles = find_cycles(&self);
        if !cycles.is_empty() {
            let mut entities: Vec<String> = cycles.into_iter().flatten().collect();
            entities.sort();
            return Err(DependencyCycle { entities });
        }

        let mut visited = vec![false; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());
        for idx in self.graph.node_indices() {
            self.visit(idx, &mut visited, &mut order);
        }

        let (nodes, _) = self.graph.into_nodes_edges();
        let mut slots: Vec<Option<EntityNode>> = nodes.into_iter().map(|n| Some(n.weight)).collect();
        Ok(order
            .into_iter()
            .filter_map(|idx| slots[idx.index()].take())
            .map(|node| node.definition)
            .collect())
    }

    /// Post-order walk from `idx` with an explicit stack, so chain length is
    /// not bounded by the call stack
    fn visit(&self, start: NodeIndex, visited: &mut [bool], order: &mut Vec<NodeIndex>) {
        if visited[start.index()] {
            return;
        }
        visited[start.index()] = true;

        // Each frame holds a node, its dependencies and the next one to visit
        let mut stack = vec![(start, self.sorted_neighbors(start), 0usize)];
        while let Some((idx, dependencies, next)) = stack.last_mut() {
            match dependencies.get(*next).copied() {
                Some(dependency) => {
                    *next += 1;
                    if !visited[dependency.index()] {
                        visited[dependency.index()] = true;
                        let frame = (dependency, self.sorted_neighbors(dependency), 0);
                        stack.push(frame);
                    }
                }
                None => {
                    order.push(*idx);
                    stack.pop();
                }
            }
        }
    }

    fn sorted_neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        neighbors.sort();
        neighbors
    }
}

/// Order named entity schemas so dependencies load first
pub fn order_entities(schemas: BTreeMap<String, SchemaDefinition>) -> Result<Vec<SchemaDefinition>, DependencyCycle> {
    EntityGraph::build(schemas).into_load_order()
}
