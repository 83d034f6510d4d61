//! Graph edge implementation

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::node::{NodeId, Properties};

/// Unique edge identifier
pub type EdgeId = Uuid;

/// Relationship types known to the Agnosis graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    /// `(User)-[:POSTED]->(Idea)`
    Posted,
    /// `(Idea)-[:SOURCED_FROM]->(Source)`
    SourcedFrom,
    /// `(User)-[:SEEN]->(Idea)` - the idea has been served to the user
    Seen,
    /// `(User)-[:LIKES {agreement}]->(Idea)`
    Likes,
    /// `(User)-[:DISLIKES]->(Idea)`
    Dislikes,
}

impl RelType {
    /// Relationship name as exposed over the API
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::Posted => "POSTED",
            RelType::SourcedFrom => "SOURCED_FROM",
            RelType::Seen => "SEEN",
            RelType::Likes => "LIKES",
            RelType::Dislikes => "DISLIKES",
        }
    }

    /// Whether this relationship is a user reaction to an idea
    pub fn is_reaction(&self) -> bool {
        matches!(self, RelType::Likes | RelType::Dislikes)
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed, typed graph edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier
    pub id: EdgeId,
    /// Source node
    pub from: NodeId,
    /// Relationship type
    pub rel: RelType,
    /// Target node
    pub to: NodeId,
    /// Edge properties
    pub properties: Properties,
}

impl Edge {
    /// Create a new edge with a fresh id
    pub fn new(from: NodeId, rel: RelType, to: NodeId, properties: Properties) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            rel,
            to,
            properties,
        }
    }

    /// Look up an integer property
    pub fn int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(serde_json::Value::as_i64)
    }
}
