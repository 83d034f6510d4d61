//! Graph persistence layer
//!
//! `GraphStore` is the seam between domain operations and the storage
//! backend. Domain code is written against the trait the way Cypher
//! transaction functions are written against a driver session; the embedded
//! `MemStore` is the one shipped implementation.

pub mod factory;
pub mod mem_store;

use std::sync::Arc;

pub use factory::{create_shared_storage, create_storage};
pub use mem_store::MemStore;

use crate::core::error::StorageError;
use crate::graph::{Edge, Label, Node, NodeId, Properties, RelType};

/// Shared storage handle passed to the API layer
pub type SharedStorage = Arc<MemStore>;

/// Storage backend interface for the Agnosis property graph
pub trait GraphStore: Send + Sync {
    /// Create a node, enforcing unique property constraints for its label
    fn create_node(&self, label: Label, props: Properties) -> Result<Node, StorageError>;

    /// Fetch a node by id
    fn node(&self, id: NodeId) -> Option<Node>;

    /// Find a node by label and exact string property value
    fn find_node(&self, label: Label, key: &str, value: &str) -> Option<Node>;

    /// All nodes carrying a label
    fn nodes_with_label(&self, label: Label) -> Vec<Node>;

    /// Merge properties into an existing node, re-checking constraints
    fn update_node(&self, id: NodeId, props: Properties) -> Result<Node, StorageError>;

    /// Delete a node and detach all of its edges
    fn delete_node(&self, id: NodeId) -> Result<(), StorageError>;

    /// Create a directed edge between two existing nodes
    fn create_edge(
        &self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError>;

    /// Create an edge, first removing any existing edges of the `displace`
    /// types between the same endpoints. Removal and creation happen under
    /// one lock acquisition, so no concurrent caller can observe (or leave
    /// behind) more than one of the displaced types on a pair of nodes.
    fn replace_edges(
        &self,
        from: NodeId,
        displace: &[RelType],
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError>;

    /// Create an edge, replacing any existing edge of the same type between
    /// the same endpoints (Cypher MERGE-and-SET semantics)
    fn merge_edge(
        &self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError> {
        self.replace_edges(from, &[rel], rel, to, props)
    }

    /// Outgoing edges of a node
    fn edges_from(&self, id: NodeId) -> Vec<Edge>;

    /// Incoming edges of a node
    fn edges_to(&self, id: NodeId) -> Vec<Edge>;

    /// The edge of a given type between two nodes, if any
    fn edge_between(&self, from: NodeId, to: NodeId, rel: RelType) -> Option<Edge>;

    /// Total node count
    fn node_count(&self) -> usize;

    /// Total edge count
    fn edge_count(&self) -> usize;
}
