//! Idea routes: posting, recommendations, reactions, details

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::{AuthClaims, FieldErrors, Valid, Validate};
use crate::api::server::AppState;
use crate::core::error::{Error, Result};
use crate::domain::ideas::{self, NewIdea};

use super::authorize_self;

/// Body of `POST /api/ideas`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdeaRequest {
    /// Link to the idea
    pub url: String,
    /// What the idea is about
    pub description: String,
    /// Optional source attribution
    pub source_id: Option<String>,
}

impl Validate for PostIdeaRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.require("url", !self.url.trim().is_empty(), "must not be empty");
        errors.require(
            "description",
            !self.description.trim().is_empty(),
            "must not be empty",
        );
        errors.finish()
    }
}

/// Body of `POST /api/ideas/:id/react`
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    /// `"like"` or `"dislike"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Agreement score, required when liking
    pub agreement: Option<i64>,
}

impl Validate for ReactionRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        let known = matches!(self.kind.as_str(), "like" | "dislike");
        errors.require("type", known, "must be \"like\" or \"dislike\"");
        errors.require(
            "agreement",
            self.kind != "like" || self.agreement.is_some(),
            "required when type is \"like\"",
        );
        errors.finish()
    }
}

/// Query string of `GET /api/ideas/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Substring to look for in descriptions
    pub q: Option<String>,
}

/// Query string of `GET /api/ideas/:id`
#[derive(Debug, Deserialize)]
pub struct DetailsParams {
    /// `"true"` to include aggregate reaction stats
    #[serde(rename = "with-reactions")]
    pub with_reactions: Option<String>,
    /// `"true"` to also include the requesting user's own reaction
    #[serde(rename = "with-user-reaction")]
    pub with_user_reaction: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// Post a new idea; responds 201
pub async fn post_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Valid(req): Valid<PostIdeaRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let idea = ideas::add_idea(
        &*state.store,
        &NewIdea {
            url: req.url,
            description: req.description,
            user_id: claims.user_id,
            source_id: req.source_id,
        },
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "idea": idea }))))
}

/// A uniformly random idea; public, `idea` is null when the store is empty
pub async fn random_idea(State(state): State<AppState>) -> Result<Json<Value>> {
    let idea = ideas::random_idea(&*state.store)?;
    Ok(Json(json!({ "idea": idea })))
}

/// A random idea the user has not seen yet
pub async fn random_unseen_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    match ideas::random_unseen_idea(&*state.store, &claims.user_id)? {
        Some(idea) => Ok(Json(json!({ "idea": idea }))),
        None => Err(Error::not_found(
            "We are all out of ideas you haven't seen before.",
        )),
    }
}

/// The most liked idea the user has not seen yet
pub async fn popular_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    match ideas::popular_unseen_idea(&*state.store, &claims.user_id)? {
        Some(idea) => Ok(Json(json!({ "idea": idea }))),
        None => Err(Error::not_found(
            "We are all out of ideas you haven't seen before.",
        )),
    }
}

/// An unseen idea the user is predicted to agree with
pub async fn agreeable_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    match ideas::get_agreeable_idea(&*state.store, &claims.user_id)? {
        Some(scored) => Ok(Json(json!({ "idea": scored.idea }))),
        None => Err(Error::not_found("We are all out of nice ideas.")),
    }
}

/// An unseen idea the user is predicted to disagree with
pub async fn disagreeable_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    match ideas::get_disagreeable_idea(&*state.store, &claims.user_id)? {
        Some(scored) => Ok(Json(json!({ "idea": scored.idea }))),
        None => Err(Error::not_found(
            "We are all out of ideas for you to disagree with.",
        )),
    }
}

/// Search idea descriptions
pub async fn search_ideas(
    State(state): State<AppState>,
    AuthClaims(_): AuthClaims,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let query = params.q.ok_or_else(|| {
        Error::validation(
            "Invalid request body",
            [("q".to_string(), "required".to_string())],
        )
    })?;

    let found = ideas::search_ideas(&*state.store, &query)?;
    Ok(Json(json!({ "ideas": found })))
}

/// Record a like or dislike on an idea
pub async fn react_to_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
    Valid(req): Valid<ReactionRequest>,
) -> Result<Json<Value>> {
    let result = match req.kind.as_str() {
        "like" => ideas::like_idea(
            &*state.store,
            &claims.user_id,
            &id,
            req.agreement.unwrap_or_default(),
        ),
        _ => ideas::dislike_idea(&*state.store, &claims.user_id, &id),
    };

    let reaction = result.map_err(|err| match err {
        Error::NotFound(_) => Error::validation("Reaction could not be saved.", Vec::new()),
        other => other,
    })?;

    Ok(Json(json!({ "reaction": reaction })))
}

/// All ideas served to the user so far
pub async fn viewed_ideas(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    let seen = ideas::get_seen_ideas(&*state.store, &claims.user_id)?;
    Ok(Json(json!({ "ideas": seen })))
}

/// Seen ideas, each with the user's reaction and aggregate stats
pub async fn viewed_ideas_with_relationships(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    let seen = ideas::seen_ideas_with_reactions(&*state.store, &claims.user_id)?;
    Ok(Json(json!({ "ideas": seen })))
}

/// Ideas the user has liked
pub async fn liked_ideas(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    let liked = ideas::get_liked_ideas(&*state.store, &claims.user_id)?;
    Ok(Json(json!({ "ideas": liked })))
}

/// Ideas the user has disliked
pub async fn disliked_ideas(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Value>> {
    let disliked = ideas::get_disliked_ideas(&*state.store, &claims.user_id)?;
    Ok(Json(json!({ "ideas": disliked })))
}

/// Ideas posted by a user; only the user themself may ask
pub async fn posted_by_user(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    authorize_self(&claims, &user_id)?;
    let posted = ideas::get_posted_ideas(&*state.store, &user_id)?;
    Ok(Json(json!({ "ideas": posted })))
}

/// Aggregate reaction stats for one idea, plus the user's own reaction
pub async fn idea_reactions(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let details = ideas::get_idea_details(&*state.store, &id, true, Some(&claims.user_id))
        .map_err(|err| match err {
            Error::NotFound(_) => Error::not_found("Reactions not found."),
            other => other,
        })?;

    Ok(Json(json!({
        "reactions": {
            "userReaction": details.user_reaction,
            "userAgreement": details.user_agreement,
            "allReactions": details.all_reactions,
            "allAgreement": details.all_agreement,
        }
    })))
}

/// One idea, optionally with aggregates and the user's own reaction
pub async fn idea_details(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
    Query(params): Query<DetailsParams>,
) -> Result<Json<Value>> {
    let idea = if flag(&params.with_user_reaction) {
        ideas::get_idea_details(&*state.store, &id, true, Some(&claims.user_id))?
    } else {
        ideas::get_idea_details(&*state.store, &id, flag(&params.with_reactions), None)?
    };

    Ok(Json(json!({ "idea": idea })))
}

/// Delete an idea the user posted; responds with the deleted id
pub async fn delete_idea(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let deleted = ideas::delete_idea(&*state.store, &id, &claims.user_id)?;
    Ok(Json(json!({ "deleted": deleted })))
}
