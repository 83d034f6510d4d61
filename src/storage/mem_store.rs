//! In-memory property graph store
//!
//! Lock-free `DashMap` tables for nodes, edges, and adjacency, with a single
//! write mutex serializing mutations that touch more than one table
//! (constraint claims, detach-delete, merge). Reads never take the mutex.

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::core::error::StorageError;
use crate::graph::{Edge, EdgeId, Label, Node, NodeId, Properties, RelType};
use crate::storage::GraphStore;
use crate::system::metrics;

/// Unique property constraints enforced by every store instance.
///
/// Mirrors the Neo4j schema the original deployment relied on: duplicate
/// emails, usernames, and source names must be rejected at the storage layer
/// so concurrent registrations cannot race past an application-level check.
const UNIQUE_CONSTRAINTS: &[(Label, &str)] = &[
    (Label::User, "email"),
    (Label::User, "username"),
    (Label::Source, "name"),
];

/// Embedded in-memory graph store
pub struct MemStore {
    /// All nodes by id
    nodes: DashMap<NodeId, Node>,
    /// All edges by id
    edges: DashMap<EdgeId, Edge>,
    /// Outgoing edge ids per node
    outgoing: DashMap<NodeId, Vec<EdgeId>>,
    /// Incoming edge ids per node
    incoming: DashMap<NodeId, Vec<EdgeId>>,
    /// Unique index: (label, property key, property value) -> owning node
    unique: DashMap<(Label, String, String), NodeId>,
    /// Serializes multi-table mutations
    write_lock: Mutex<()>,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
            edges: DashMap::new(),
            outgoing: DashMap::new(),
            incoming: DashMap::new(),
            unique: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn constrained_keys(label: Label) -> impl Iterator<Item = &'static str> {
        UNIQUE_CONSTRAINTS
            .iter()
            .filter(move |(l, _)| *l == label)
            .map(|(_, key)| *key)
    }

    /// Extract the string value of a constrained property, if present
    fn constraint_value(
        label: Label,
        key: &'static str,
        props: &Properties,
    ) -> Result<Option<String>, StorageError> {
        match props.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| StorageError::InvalidProperty {
                    label: label.to_string(),
                    key: key.to_string(),
                }),
        }
    }

    /// Remove an edge from both adjacency lists and the edge table.
    /// Caller holds the write lock.
    fn remove_edge_locked(&self, edge_id: EdgeId) {
        if let Some((_, edge)) = self.edges.remove(&edge_id) {
            if let Some(mut out) = self.outgoing.get_mut(&edge.from) {
                out.retain(|id| *id != edge_id);
            }
            if let Some(mut inc) = self.incoming.get_mut(&edge.to) {
                inc.retain(|id| *id != edge_id);
            }
        }
    }

    /// Caller holds the write lock.
    fn create_edge_locked(
        &self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError> {
        if !self.nodes.contains_key(&from) {
            return Err(StorageError::NodeNotFound {
                id: from.to_string(),
            });
        }
        if !self.nodes.contains_key(&to) {
            return Err(StorageError::NodeNotFound { id: to.to_string() });
        }

        let edge = Edge::new(from, rel, to, props);
        self.outgoing.entry(from).or_default().push(edge.id);
        self.incoming.entry(to).or_default().push(edge.id);
        self.edges.insert(edge.id, edge.clone());
        metrics::metrics().edges_created.inc();
        Ok(edge)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemStore {
    fn create_node(&self, label: Label, props: Properties) -> Result<Node, StorageError> {
        let _guard = self.write_lock.lock();

        for key in Self::constrained_keys(label) {
            if let Some(value) = Self::constraint_value(label, key, &props)? {
                if self.unique.contains_key(&(label, key.to_string(), value)) {
                    return Err(StorageError::ConstraintViolation {
                        label: label.to_string(),
                        key: key.to_string(),
                    });
                }
            }
        }

        let node = Node::new(label, props);
        for key in Self::constrained_keys(label) {
            if let Some(value) = Self::constraint_value(label, key, &node.properties)? {
                self.unique.insert((label, key.to_string(), value), node.id);
            }
        }
        self.nodes.insert(node.id, node.clone());
        metrics::metrics().nodes_created.inc();
        Ok(node)
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).map(|n| n.clone())
    }

    fn find_node(&self, label: Label, key: &str, value: &str) -> Option<Node> {
        // Constrained properties resolve through the unique index
        if UNIQUE_CONSTRAINTS.iter().any(|(l, k)| *l == label && *k == key) {
            let id = *self
                .unique
                .get(&(label, key.to_string(), value.to_string()))?;
            return self.node(id);
        }

        self.nodes
            .iter()
            .find(|n| n.label == label && n.str_property(key) == Some(value))
            .map(|n| n.clone())
    }

    fn nodes_with_label(&self, label: Label) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|n| n.label == label)
            .map(|n| n.clone())
            .collect()
    }

    fn update_node(&self, id: NodeId, props: Properties) -> Result<Node, StorageError> {
        let _guard = self.write_lock.lock();

        let label = self
            .nodes
            .get(&id)
            .map(|n| n.label)
            .ok_or_else(|| StorageError::NodeNotFound { id: id.to_string() })?;

        // Claim new unique values before releasing old ones
        for key in Self::constrained_keys(label) {
            if let Some(value) = Self::constraint_value(label, key, &props)? {
                let index_key = (label, key.to_string(), value);
                if let Some(owner) = self.unique.get(&index_key) {
                    if *owner != id {
                        return Err(StorageError::ConstraintViolation {
                            label: label.to_string(),
                            key: key.to_string(),
                        });
                    }
                }
            }
        }

        let mut node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StorageError::NodeNotFound { id: id.to_string() })?;

        for key in Self::constrained_keys(label) {
            if let Some(new_value) = Self::constraint_value(label, key, &props)? {
                if let Some(old_value) = node.str_property(key) {
                    self.unique.remove(&(label, key.to_string(), old_value.to_string()));
                }
                self.unique.insert((label, key.to_string(), new_value), id);
            }
        }

        for (key, value) in props {
            node.properties.insert(key, value);
        }
        Ok(node.clone())
    }

    fn delete_node(&self, id: NodeId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        let (_, node) = self
            .nodes
            .remove(&id)
            .ok_or_else(|| StorageError::NodeNotFound { id: id.to_string() })?;

        for key in Self::constrained_keys(node.label) {
            if let Some(value) = node.str_property(key) {
                self.unique
                    .remove(&(node.label, key.to_string(), value.to_string()));
            }
        }

        // Detach: drop every edge touching this node
        let mut touching: Vec<EdgeId> = Vec::new();
        if let Some((_, out)) = self.outgoing.remove(&id) {
            touching.extend(out);
        }
        if let Some((_, inc)) = self.incoming.remove(&id) {
            touching.extend(inc);
        }
        for edge_id in touching {
            self.remove_edge_locked(edge_id);
        }

        Ok(())
    }

    fn create_edge(
        &self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError> {
        let _guard = self.write_lock.lock();
        self.create_edge_locked(from, rel, to, props)
    }

    fn replace_edges(
        &self,
        from: NodeId,
        displace: &[RelType],
        rel: RelType,
        to: NodeId,
        props: Properties,
    ) -> Result<Edge, StorageError> {
        let _guard = self.write_lock.lock();

        let existing: Vec<EdgeId> = self
            .outgoing
            .get(&from)
            .map(|out| {
                out.iter()
                    .filter(|edge_id| {
                        self.edges
                            .get(edge_id)
                            .map(|e| e.to == to && displace.contains(&e.rel))
                            .unwrap_or(false)
                    })
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        for edge_id in existing {
            self.remove_edge_locked(edge_id);
        }

        self.create_edge_locked(from, rel, to, props)
    }

    fn edges_from(&self, id: NodeId) -> Vec<Edge> {
        self.outgoing
            .get(&id)
            .map(|out| {
                out.iter()
                    .filter_map(|edge_id| self.edges.get(edge_id).map(|e| e.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn edges_to(&self, id: NodeId) -> Vec<Edge> {
        self.incoming
            .get(&id)
            .map(|inc| {
                inc.iter()
                    .filter_map(|edge_id| self.edges.get(edge_id).map(|e| e.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn edge_between(&self, from: NodeId, to: NodeId, rel: RelType) -> Option<Edge> {
        self.edges_from(from)
            .into_iter()
            .find(|e| e.to == to && e.rel == rel)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
