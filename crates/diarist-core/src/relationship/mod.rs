//! Relationship graph
//!
//! People named in a profile become nodes of a small directed graph; how
//! they are related becomes labeled edges. Every relation is stored in both
//! directions: `sam -> alex` is labeled `son`, `alex -> sam` is labeled
//! `son of sam`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diarist_core::relationship::{build_graph, resolve, UNKNOWN_RELATIONSHIP};
//!
//! let graph = build_graph(&profile);
//! assert_eq!(resolve(&graph, "Sam", "Alex"), "son");
//! assert_eq!(resolve(&graph, "Sam", "Nobody"), UNKNOWN_RELATIONSHIP);
//! ```

mod builder;
mod graph;
mod resolver;

pub use builder::build_graph;
pub use graph::{RelationEdge, RelationshipGraph};
pub use resolver::{UNKNOWN_RELATIONSHIP, resolve, shortest_path};
