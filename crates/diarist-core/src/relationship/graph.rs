//! Directed, edge-labeled graph of people

use std::collections::HashMap;

use serde_json::Value;

/// An outgoing edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    /// Lower-cased name of the node the edge points to
    pub target: String,
    /// Free-text relation label (e.g. "son", "friend of sam")
    pub relation: String,
}

/// Directed graph of people keyed by lower-cased name
///
/// Node payloads are the profile fragments the people came from. Adding a
/// node that already exists replaces its payload; adding an edge that
/// already exists replaces its label.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    nodes: HashMap<String, Value>,
    edges: HashMap<String, Vec<RelationEdge>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a node, returning its key
    pub fn add_node(&mut self, name: &str, info: Value) -> String {
        let key = name.to_lowercase();
        self.nodes.insert(key.clone(), info);
        key
    }

    /// Insert a labeled edge between two existing keys
    ///
    /// Self-loops are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str, relation: impl Into<String>) {
        if from == to {
            return;
        }
        let relation = relation.into();
        let outgoing = self.edges.entry(from.to_string()).or_default();
        match outgoing.iter_mut().find(|edge| edge.target == to) {
            Some(edge) => edge.relation = relation,
            None => outgoing.push(RelationEdge {
                target: to.to_string(),
                relation,
            }),
        }
    }

    /// Add the forward edge `from -> to` labeled `relation` and the backward
    /// edge `to -> from` labeled `"<relation> of <from>"`
    pub fn add_relation(&mut self, from: &str, to: &str, relation: &str) {
        self.add_edge(from, to, relation);
        self.add_edge(to, from, format!("{} of {}", relation, from));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Payload stored for a node
    pub fn node_info(&self, key: &str) -> Option<&Value> {
        self.nodes.get(key)
    }

    /// Label of the direct edge `from -> to`, if any
    pub fn edge(&self, from: &str, to: &str) -> Option<&str> {
        self.neighbors(from)
            .iter()
            .find(|edge| edge.target == to)
            .map(|edge| edge.relation.as_str())
    }

    /// Outgoing edges of a node, in insertion order
    pub fn neighbors(&self, key: &str) -> &[RelationEdge] {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Node keys in sorted order
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}
