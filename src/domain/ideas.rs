//! Ideas and reactions
//!
//! The heart of the graph: posting ideas, recording reactions, and the
//! recommendation queries built on top of them. A reaction is one edge per
//! (user, idea) pair; liking carries an `agreement` score (how much the user
//! agrees, negative allowed) that is independent of being interested.
//!
//! Agreeable/disagreeable picks use collaborative scoring: each reaction maps
//! to a numeric stance (LIKES -> its agreement, DISLIKES -> -1), user
//! similarity is the dot product of stances over commonly-reacted ideas, and
//! an unseen idea's predicted agreement sums `similarity * stance` over every
//! other user who reacted to it.

use std::collections::HashMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::json;

use crate::core::error::{Error, Result};
use crate::domain::lookup;
use crate::graph::{Edge, Label, Node, NodeId, Properties, RelType};
use crate::storage::GraphStore;
use crate::system::metrics;

/// Public view of an idea
#[derive(Debug, Clone, Serialize)]
pub struct IdeaView {
    /// The idea's id
    #[serde(rename = "ideaId")]
    pub idea_id: String,
    /// Link to the idea
    pub url: String,
    /// What the idea is about
    pub description: String,
    /// When it was posted
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// The source it came from, when attributed
    #[serde(rename = "sourceId", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

/// A recorded reaction
#[derive(Debug, Clone, Serialize)]
pub struct ReactionView {
    /// Relationship type: `LIKES` or `DISLIKES`
    #[serde(rename = "type")]
    pub kind: String,
    /// Agreement score, only present on likes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<i64>,
    /// The idea reacted to
    #[serde(rename = "ideaId")]
    pub idea_id: String,
    /// The reacting user
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// An idea with optional reaction aggregates
#[derive(Debug, Clone, Serialize)]
pub struct IdeaDetails {
    /// The idea itself
    #[serde(flatten)]
    pub idea: IdeaView,
    /// Total number of reactions, when requested
    #[serde(rename = "allReactions", skip_serializing_if = "Option::is_none")]
    pub all_reactions: Option<usize>,
    /// Sum of agreement across all likes, when requested
    #[serde(rename = "allAgreement", skip_serializing_if = "Option::is_none")]
    pub all_agreement: Option<i64>,
    /// The requesting user's reaction type, when requested
    #[serde(rename = "userReaction", skip_serializing_if = "Option::is_none")]
    pub user_reaction: Option<String>,
    /// The requesting user's agreement, when requested
    #[serde(rename = "userAgreement", skip_serializing_if = "Option::is_none")]
    pub user_agreement: Option<i64>,
}

/// An idea with its predicted agreement for a user
#[derive(Debug, Clone)]
pub struct ScoredIdea {
    /// The recommended idea
    pub idea: IdeaView,
    /// Predicted agreement (positive: agreeable, negative: disagreeable)
    pub score: i64,
}

/// A new idea to post
#[derive(Debug, Clone)]
pub struct NewIdea {
    /// Link to the idea
    pub url: String,
    /// What the idea is about
    pub description: String,
    /// The posting user's id
    pub user_id: String,
    /// Optional source attribution
    pub source_id: Option<String>,
}

/// Post a new idea
pub fn add_idea<S: GraphStore>(store: &S, new: &NewIdea) -> Result<IdeaView> {
    let user = lookup(store, Label::User, &new.user_id, "User not found")?;

    let source = match &new.source_id {
        Some(id) => Some(lookup(store, Label::Source, id, "Source not found.")?),
        None => None,
    };

    let mut props = Properties::new();
    props.insert("url".to_string(), json!(new.url));
    props.insert("description".to_string(), json!(new.description));
    props.insert("createdAt".to_string(), json!(Utc::now().to_rfc3339()));

    let idea = store.create_node(Label::Idea, props)?;
    store.create_edge(user.id, RelType::Posted, idea.id, Properties::new())?;
    if let Some(source) = source {
        store.create_edge(idea.id, RelType::SourcedFrom, source.id, Properties::new())?;
    }

    view(store, &idea)
}

/// A uniformly random idea; does not mark anything seen
pub fn random_idea<S: GraphStore>(store: &S) -> Result<Option<IdeaView>> {
    let ideas = store.nodes_with_label(Label::Idea);
    match ideas.choose(&mut rand::thread_rng()) {
        Some(node) => view(store, node).map(Some),
        None => Ok(None),
    }
}

/// A random idea the user has not been served yet; marks it seen
pub fn random_unseen_idea<S: GraphStore>(store: &S, user_id: &str) -> Result<Option<IdeaView>> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let unseen = unseen_ideas(store, user.id);

    match unseen.choose(&mut rand::thread_rng()) {
        Some(node) => {
            mark_seen(store, user.id, node.id)?;
            view(store, node).map(Some)
        }
        None => Ok(None),
    }
}

/// The most-liked idea the user has not been served yet; marks it seen
pub fn popular_unseen_idea<S: GraphStore>(store: &S, user_id: &str) -> Result<Option<IdeaView>> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let unseen = unseen_ideas(store, user.id);

    let most_liked = unseen.into_iter().max_by_key(|node| {
        let likes = store
            .edges_to(node.id)
            .iter()
            .filter(|e| e.rel == RelType::Likes)
            .count();
        (likes, node.id)
    });

    match most_liked {
        Some(node) => {
            mark_seen(store, user.id, node.id)?;
            view(store, &node).map(Some)
        }
        None => Ok(None),
    }
}

/// The unseen idea the user is predicted to agree with most; marks it seen.
/// `None` when no unseen idea has a strictly positive prediction.
pub fn get_agreeable_idea<S: GraphStore>(store: &S, user_id: &str) -> Result<Option<ScoredIdea>> {
    scored_pick(store, user_id, |score| score > 0, |best, score| score > best)
}

/// The unseen idea the user is predicted to disagree with most; marks it
/// seen. `None` when no unseen idea has a strictly negative prediction.
pub fn get_disagreeable_idea<S: GraphStore>(
    store: &S,
    user_id: &str,
) -> Result<Option<ScoredIdea>> {
    scored_pick(store, user_id, |score| score < 0, |best, score| score < best)
}

/// Record a like with an agreement score, replacing any prior reaction
pub fn like_idea<S: GraphStore>(
    store: &S,
    user_id: &str,
    idea_id: &str,
    agreement: i64,
) -> Result<ReactionView> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let idea = lookup(store, Label::Idea, idea_id, "Idea not found.")?;

    let mut props = Properties::new();
    props.insert("agreement".to_string(), json!(agreement));
    store.replace_edges(
        user.id,
        &[RelType::Likes, RelType::Dislikes],
        RelType::Likes,
        idea.id,
        props,
    )?;
    mark_seen(store, user.id, idea.id)?;
    metrics::metrics().reactions_recorded.inc();

    Ok(ReactionView {
        kind: RelType::Likes.to_string(),
        agreement: Some(agreement),
        idea_id: idea.id.to_string(),
        user_id: user.id.to_string(),
    })
}

/// Record a dislike, replacing any prior reaction
pub fn dislike_idea<S: GraphStore>(
    store: &S,
    user_id: &str,
    idea_id: &str,
) -> Result<ReactionView> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let idea = lookup(store, Label::Idea, idea_id, "Idea not found.")?;

    store.replace_edges(
        user.id,
        &[RelType::Likes, RelType::Dislikes],
        RelType::Dislikes,
        idea.id,
        Properties::new(),
    )?;
    mark_seen(store, user.id, idea.id)?;
    metrics::metrics().reactions_recorded.inc();

    Ok(ReactionView {
        kind: RelType::Dislikes.to_string(),
        agreement: None,
        idea_id: idea.id.to_string(),
        user_id: user.id.to_string(),
    })
}

/// Ideas the user has been served
pub fn get_seen_ideas<S: GraphStore>(store: &S, user_id: &str) -> Result<Vec<IdeaView>> {
    ideas_behind_edges(store, user_id, RelType::Seen)
}

/// Ideas the user has liked
pub fn get_liked_ideas<S: GraphStore>(store: &S, user_id: &str) -> Result<Vec<IdeaView>> {
    ideas_behind_edges(store, user_id, RelType::Likes)
}

/// Ideas the user has disliked
pub fn get_disliked_ideas<S: GraphStore>(store: &S, user_id: &str) -> Result<Vec<IdeaView>> {
    ideas_behind_edges(store, user_id, RelType::Dislikes)
}

/// Ideas the user has posted
pub fn get_posted_ideas<S: GraphStore>(store: &S, user_id: &str) -> Result<Vec<IdeaView>> {
    ideas_behind_edges(store, user_id, RelType::Posted)
}

/// Seen ideas, each with the user's own reaction and aggregate stats
pub fn seen_ideas_with_reactions<S: GraphStore>(
    store: &S,
    user_id: &str,
) -> Result<Vec<IdeaDetails>> {
    let user = lookup(store, Label::User, user_id, "User not found")?;

    let mut details = Vec::new();
    for edge in store.edges_from(user.id) {
        if edge.rel != RelType::Seen {
            continue;
        }
        let Some(node) = store.node(edge.to) else {
            continue;
        };
        details.push(build_details(store, &node, true, Some(user.id))?);
    }
    details.sort_by(|a, b| {
        (&a.idea.created_at, &a.idea.idea_id).cmp(&(&b.idea.created_at, &b.idea.idea_id))
    });
    Ok(details)
}

/// Fetch one idea, optionally with aggregates and the viewer's own reaction
pub fn get_idea_details<S: GraphStore>(
    store: &S,
    idea_id: &str,
    with_reactions: bool,
    user_id: Option<&str>,
) -> Result<IdeaDetails> {
    let idea = lookup(store, Label::Idea, idea_id, "Idea not found.")?;

    let viewer = match user_id {
        Some(id) => Some(lookup(store, Label::User, id, "User not found")?.id),
        None => None,
    };

    build_details(store, &idea, with_reactions, viewer)
}

/// Delete an idea, but only for the user who posted it. Returns the deleted
/// idea's id.
pub fn delete_idea<S: GraphStore>(store: &S, idea_id: &str, user_id: &str) -> Result<String> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let idea = lookup(store, Label::Idea, idea_id, "Idea not found.")?;

    if store
        .edge_between(user.id, idea.id, RelType::Posted)
        .is_none()
    {
        return Err(Error::not_found("Idea not found."));
    }

    store.delete_node(idea.id)?;
    Ok(idea.id.to_string())
}

/// Case-insensitive substring search over idea descriptions
pub fn search_ideas<S: GraphStore>(store: &S, query: &str) -> Result<Vec<IdeaView>> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();
    for node in store.nodes_with_label(Label::Idea) {
        let matched = node
            .str_property("description")
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if matched {
            matches.push(view(store, &node)?);
        }
    }
    sort_views(&mut matches);
    Ok(matches)
}

// ---------------------------------------------------------------------------
// Internals

fn view<S: GraphStore>(store: &S, node: &Node) -> Result<IdeaView> {
    let url = node
        .str_property("url")
        .ok_or_else(|| Error::internal("idea record missing url"))?;
    let description = node
        .str_property("description")
        .ok_or_else(|| Error::internal("idea record missing description"))?;
    let created_at = node.str_property("createdAt").unwrap_or_default();

    let source_id = store
        .edges_from(node.id)
        .iter()
        .find(|e| e.rel == RelType::SourcedFrom)
        .map(|e| e.to.to_string());

    Ok(IdeaView {
        idea_id: node.id.to_string(),
        url: url.to_string(),
        description: description.to_string(),
        created_at: created_at.to_string(),
        source_id,
    })
}

fn sort_views(views: &mut [IdeaView]) {
    views.sort_by(|a, b| (&a.created_at, &a.idea_id).cmp(&(&b.created_at, &b.idea_id)));
}

fn mark_seen<S: GraphStore>(store: &S, user: NodeId, idea: NodeId) -> Result<()> {
    let mut props = Properties::new();
    props.insert("seenAt".to_string(), json!(Utc::now().to_rfc3339()));
    store.merge_edge(user, RelType::Seen, idea, props)?;
    Ok(())
}

fn unseen_ideas<S: GraphStore>(store: &S, user: NodeId) -> Vec<Node> {
    let seen: std::collections::HashSet<NodeId> = store
        .edges_from(user)
        .iter()
        .filter(|e| e.rel == RelType::Seen)
        .map(|e| e.to)
        .collect();

    store
        .nodes_with_label(Label::Idea)
        .into_iter()
        .filter(|node| !seen.contains(&node.id))
        .collect()
}

fn ideas_behind_edges<S: GraphStore>(
    store: &S,
    user_id: &str,
    rel: RelType,
) -> Result<Vec<IdeaView>> {
    let user = lookup(store, Label::User, user_id, "User not found")?;

    let mut views = Vec::new();
    for edge in store.edges_from(user.id) {
        if edge.rel != rel {
            continue;
        }
        if let Some(node) = store.node(edge.to) {
            if node.label == Label::Idea {
                views.push(view(store, &node)?);
            }
        }
    }
    sort_views(&mut views);
    Ok(views)
}

fn build_details<S: GraphStore>(
    store: &S,
    idea: &Node,
    with_reactions: bool,
    viewer: Option<NodeId>,
) -> Result<IdeaDetails> {
    let mut details = IdeaDetails {
        idea: view(store, idea)?,
        all_reactions: None,
        all_agreement: None,
        user_reaction: None,
        user_agreement: None,
    };

    if with_reactions {
        let reactions: Vec<Edge> = store
            .edges_to(idea.id)
            .into_iter()
            .filter(|e| e.rel.is_reaction())
            .collect();
        details.all_reactions = Some(reactions.len());
        details.all_agreement = Some(
            reactions
                .iter()
                .filter(|e| e.rel == RelType::Likes)
                .filter_map(|e| e.int_property("agreement"))
                .sum(),
        );
    }

    if let Some(viewer) = viewer {
        let own = store
            .edges_to(idea.id)
            .into_iter()
            .find(|e| e.from == viewer && e.rel.is_reaction());
        if let Some(edge) = own {
            details.user_reaction = Some(edge.rel.to_string());
            details.user_agreement = edge.int_property("agreement");
        }
    }

    Ok(details)
}

/// The numeric stance a reaction edge encodes. A LIKES edge without an
/// `agreement` property cannot be produced by `like_idea`; such an edge is
/// ignored rather than given an invented score.
fn stance(edge: &Edge) -> Option<i64> {
    match edge.rel {
        RelType::Likes => edge.int_property("agreement"),
        RelType::Dislikes => Some(-1),
        _ => None,
    }
}

/// All of a user's stances, keyed by idea
fn stance_map<S: GraphStore>(store: &S, user: NodeId) -> HashMap<NodeId, i64> {
    store
        .edges_from(user)
        .iter()
        .filter_map(|e| stance(e).map(|s| (e.to, s)))
        .collect()
}

/// Dot product of two users' stances over commonly-reacted ideas
fn similarity<S: GraphStore>(store: &S, mine: &HashMap<NodeId, i64>, other: NodeId) -> i64 {
    store
        .edges_from(other)
        .iter()
        .filter_map(|e| {
            let theirs = stance(e)?;
            let ours = mine.get(&e.to)?;
            Some(ours * theirs)
        })
        .sum()
}

/// Predicted agreement of `idea` for the user whose stances are `mine`
fn predicted_agreement<S: GraphStore>(
    store: &S,
    user: NodeId,
    idea: NodeId,
    mine: &HashMap<NodeId, i64>,
    similarities: &mut HashMap<NodeId, i64>,
) -> i64 {
    store
        .edges_to(idea)
        .iter()
        .filter(|e| e.from != user)
        .filter_map(|e| {
            let theirs = stance(e)?;
            let sim = *similarities
                .entry(e.from)
                .or_insert_with(|| similarity(store, mine, e.from));
            Some(sim * theirs)
        })
        .sum()
}

fn scored_pick<S: GraphStore>(
    store: &S,
    user_id: &str,
    qualifies: impl Fn(i64) -> bool,
    beats: impl Fn(i64, i64) -> bool,
) -> Result<Option<ScoredIdea>> {
    let user = lookup(store, Label::User, user_id, "User not found")?;
    let mine = stance_map(store, user.id);
    let mut similarities = HashMap::new();

    let mut best: Option<(Node, i64)> = None;
    for node in unseen_ideas(store, user.id) {
        let score = predicted_agreement(store, user.id, node.id, &mine, &mut similarities);
        if !qualifies(score) {
            continue;
        }
        match &best {
            Some((_, best_score)) if !beats(*best_score, score) => {}
            _ => best = Some((node, score)),
        }
    }

    match best {
        Some((node, score)) => {
            mark_seen(store, user.id, node.id)?;
            Ok(Some(ScoredIdea {
                idea: view(store, &node)?,
                score,
            }))
        }
        None => Ok(None),
    }
}
