//! Cycle Analysis
//!
//! Strongly connected components with more than one member are dependency
//! cycles. Self-references never become edges, so single-member components
//! are always acyclic.

use petgraph::algo::kosaraju_scc;
use thiserror::Error;

use super::EntityGraph;

/// Entities that reference each other, directly or transitively
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cyclic entity dependency between {}", .entities.join(", "))]
pub struct DependencyCycle {
    /// Members of every cycle, sorted by name
    pub entities: Vec<String>,
}

/// Every dependency cycle in the graph, each sorted by name
pub fn find_cycles(graph: &EntityGraph) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut members: Vec<String> = scc
                .into_iter()
                .map(|idx| graph.graph[idx].name.clone())
                .collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, NamedField, SchemaDefinition};
    use std::collections::BTreeMap;

    fn entity(name: &str, references: &[&str]) -> (String, SchemaDefinition) {
        let fields = references
            .iter()
            .map(|r| NamedField::new(*r, FieldDefinition::foreign(*r)))
            .collect();
        (name.to_string(), SchemaDefinition::new(name, fields))
    }

    #[test]
    fn test_separate_cycles_are_reported_separately() {
        let schemas: BTreeMap<_, _> = [
            entity("a", &["b"]),
            entity("b", &["c"]),
            entity("c", &["a"]),
            entity("x", &["y"]),
            entity("y", &["x"]),
            entity("free", &["a"]),
        ]
        .into_iter()
        .collect();
        let graph = EntityGraph::build(schemas);
        assert_eq!(
            find_cycles(&graph),
            vec![vec!["a", "b", "c"], vec!["x", "y"]]
        );
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let schemas: BTreeMap<_, _> = [entity("a", &[]), entity("b", &["a"])].into_iter().collect();
        assert!(find_cycles(&EntityGraph::build(schemas)).is_empty());
    }
}
