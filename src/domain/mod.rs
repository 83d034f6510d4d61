//! Domain operations over the graph
//!
//! The equivalent of the original deployment's transaction functions: each
//! submodule issues queries and mutations against a `GraphStore` and maps
//! nodes and edges to the JSON views the API serves.

pub mod ideas;
pub mod sources;
pub mod users;

use uuid::Uuid;

use crate::core::error::{Error, Result};
use crate::graph::{Label, Node};
use crate::storage::GraphStore;

/// Resolve a path/claim id to a node with the expected label.
///
/// Malformed ids are indistinguishable from missing ones to the caller.
fn lookup<S: GraphStore>(
    store: &S,
    label: Label,
    id: &str,
    missing_msg: &str,
) -> Result<Node> {
    let id = Uuid::parse_str(id).map_err(|_| Error::not_found(missing_msg.to_string()))?;
    store
        .node(id)
        .filter(|n| n.label == label)
        .ok_or_else(|| Error::not_found(missing_msg.to_string()))
}
