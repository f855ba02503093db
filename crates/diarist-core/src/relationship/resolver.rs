//! Relationship lookup over the graph

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::graph::RelationshipGraph;

/// Label returned when no direct relationship is known
pub const UNKNOWN_RELATIONSHIP: &str = "Unknown";

/// Shortest path (by edge count) from `source` to `target`, both keys.
///
/// Breadth-first over outgoing edges; neighbors are visited in insertion
/// order, so ties resolve to the earliest-added edge. Returns `None` when
/// either node is missing or the target is unreachable.
pub fn shortest_path(graph: &RelationshipGraph, source: &str, target: &str) -> Option<Vec<String>> {
    if !graph.contains(source) || !graph.contains(target) {
        return None;
    }
    if source == target {
        return Some(vec![source.to_string()]);
    }

    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(source);
    parents.insert(source, source);

    while let Some(current) = queue.pop_front() {
        for edge in graph.neighbors(current) {
            let next = edge.target.as_str();
            if parents.contains_key(next) {
                continue;
            }
            parents.insert(next, current);
            if next == target {
                return Some(unwind(&parents, source, target));
            }
            queue.push_back(next);
        }
    }

    None
}

fn unwind(parents: &HashMap<&str, &str>, source: &str, target: &str) -> Vec<String> {
    let mut path = vec![target.to_string()];
    let mut node = target;
    while node != source {
        node = parents[node];
        path.push(node.to_string());
    }
    path.reverse();
    path
}

/// Relationship from `source_name` to `target_name`.
///
/// Names are matched case-insensitively. Only a direct edge counts: when
/// the shortest path is longer than one hop, or there is none, the answer
/// is [`UNKNOWN_RELATIONSHIP`].
pub fn resolve(graph: &RelationshipGraph, source_name: &str, target_name: &str) -> String {
    let source = source_name.to_lowercase();
    let target = target_name.to_lowercase();

    if !graph.contains(&target) {
        debug!(target = %target, "Target not found in graph");
        return UNKNOWN_RELATIONSHIP.to_string();
    }

    match shortest_path(graph, &source, &target) {
        Some(path) if path.len() == 2 => {
            let relation = graph
                .edge(&path[0], &path[1])
                .unwrap_or(UNKNOWN_RELATIONSHIP)
                .to_string();
            debug!(source = %source, target = %target, relation = %relation, "Relationship found");
            relation
        }
        Some(path) => {
            debug!(
                source = %source,
                target = %target,
                hops = path.len().saturating_sub(1),
                "No direct relationship"
            );
            UNKNOWN_RELATIONSHIP.to_string()
        }
        None => {
            debug!(source = %source, target = %target, "No path between nodes");
            UNKNOWN_RELATIONSHIP.to_string()
        }
    }
}
