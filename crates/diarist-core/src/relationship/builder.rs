//! Build a relationship graph from a personal profile

use serde_json::Value;
use tracing::debug;

use crate::profile::PersonalProfile;

use super::graph::RelationshipGraph;

/// Relation label for close friends
const FRIEND_RELATION: &str = "friend";

/// Build the relationship graph for a profile.
///
/// The main user is linked to each family member under the family key, to
/// each close friend under `friend`, and every family member is linked to
/// their own children under `grandchild (<key>)`. Pure: no I/O, same
/// profile in, same graph out.
pub fn build_graph(profile: &PersonalProfile) -> RelationshipGraph {
    let mut graph = RelationshipGraph::new();
    let main_user = graph.add_node(&profile.full_name, profile.snapshot().clone());

    for (relation_key, member) in profile.family() {
        let name = graph.add_node(&member.name, to_payload(member));
        graph.add_relation(&main_user, &name, relation_key);
        debug!(member = %name, relation = %relation_key, "Added family member");

        let grandchild_relation = format!("grandchild ({})", relation_key);
        for grandchild in &member.children {
            let gc_name = graph.add_node(&grandchild.name, to_payload(grandchild));
            graph.add_relation(&name, &gc_name, &grandchild_relation);
            debug!(
                grandchild = %gc_name,
                parent = %name,
                relation = %grandchild_relation,
                "Added grandchild"
            );
        }
    }

    for friend in profile.close_friends() {
        let name = graph.add_node(&friend.name, to_payload(friend));
        graph.add_relation(&main_user, &name, FRIEND_RELATION);
        debug!(friend = %name, "Added friend");
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Relationship graph built"
    );
    graph
}

fn to_payload<T: serde::Serialize>(fragment: &T) -> Value {
    serde_json::to_value(fragment).unwrap_or(Value::Null)
}
