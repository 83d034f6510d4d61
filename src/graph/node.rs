//! Graph node implementation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique node identifier
pub type NodeId = Uuid;

/// JSON property bag attached to nodes and edges
pub type Properties = serde_json::Map<String, Value>;

/// Node labels known to the Agnosis graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// A registered account
    User,
    /// A posted idea
    Idea,
    /// Where an idea came from
    Source,
}

impl Label {
    /// Label name as stored/displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::User => "User",
            Label::Idea => "Idea",
            Label::Source => "Source",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    pub id: NodeId,
    /// Node label
    pub label: Label,
    /// Node properties
    pub properties: Properties,
}

impl Node {
    /// Create a new node with a fresh id
    pub fn new(label: Label, properties: Properties) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            properties,
        }
    }

    /// Look up a property value
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Look up a string property
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Look up an integer property
    pub fn int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Value::as_i64)
    }
}
