//! Property graph primitives
//!
//! Nodes and edges as stored by the persistence layer. Domain meaning
//! (users, ideas, sources) lives in `crate::domain`; this module only knows
//! labels, relationship types, and JSON property bags.

pub mod edge;
pub mod node;

pub use edge::{Edge, EdgeId, RelType};
pub use node::{Label, Node, NodeId, Properties};
