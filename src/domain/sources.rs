//! Idea sources
//!
//! Sources are merge-by-name: posting the same publication twice yields one
//! node, the way the original data model used Cypher MERGE.

use serde::Serialize;
use serde_json::json;

use crate::core::error::{Error, Result};
use crate::graph::{Label, Node, Properties};
use crate::storage::GraphStore;

/// Public view of a source
#[derive(Debug, Clone, Serialize)]
pub struct SourceView {
    /// The source's id
    #[serde(rename = "sourceId")]
    pub source_id: String,
    /// Source name
    pub name: String,
}

fn view(node: &Node) -> Result<SourceView> {
    let name = node
        .str_property("name")
        .ok_or_else(|| Error::internal("source record missing name"))?;
    Ok(SourceView {
        source_id: node.id.to_string(),
        name: name.to_string(),
    })
}

/// Find or create a source by name
pub fn add_source<S: GraphStore>(store: &S, name: &str) -> Result<SourceView> {
    if let Some(existing) = store.find_node(Label::Source, "name", name) {
        return view(&existing);
    }

    let mut props = Properties::new();
    props.insert("name".to_string(), json!(name));

    match store.create_node(Label::Source, props) {
        Ok(node) => view(&node),
        // Lost a create race; the winner's node is what we wanted anyway
        Err(_) => store
            .find_node(Label::Source, "name", name)
            .ok_or_else(|| Error::internal("source vanished during merge"))
            .and_then(|node| view(&node)),
    }
}

/// Find a source by name
pub fn find_source<S: GraphStore>(store: &S, name: &str) -> Result<SourceView> {
    store
        .find_node(Label::Source, "name", name)
        .ok_or_else(|| Error::not_found("Source not found."))
        .and_then(|node| view(&node))
}

/// All sources, ordered by name
pub fn all_sources<S: GraphStore>(store: &S) -> Result<Vec<SourceView>> {
    let mut sources = store
        .nodes_with_label(Label::Source)
        .iter()
        .map(view)
        .collect::<Result<Vec<_>>>()?;
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}
