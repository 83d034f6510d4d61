//! User accounts
//!
//! Registration, credential verification, profile reads, and edits. The
//! password hash lives only in the graph node; every view built here strips
//! it before anything reaches a response body.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::auth::{self, TokenSigner};
use crate::core::error::{Error, Result, StorageError};
use crate::domain::lookup;
use crate::graph::{Label, Node, Properties};
use crate::storage::GraphStore;
use crate::system::metrics;

/// Public view of a user, without credentials
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// The user's id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub username: String,
}

/// A user plus a freshly issued session token
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// Token subject (same as `userId`)
    pub sub: String,
    /// The user's id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub username: String,
    /// Signed session token
    pub token: String,
}

/// Requested profile changes; `current_password` must verify before any apply
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    /// The user's current password, re-checked before editing
    pub current_password: String,
    /// Replacement username
    pub new_username: Option<String>,
    /// Replacement email
    pub new_email: Option<String>,
    /// Replacement password (stored hashed)
    pub new_password: Option<String>,
}

/// Register a new user and log them in
pub fn register<S: GraphStore>(
    store: &S,
    tokens: &TokenSigner,
    bcrypt_cost: u32,
    email: &str,
    username: &str,
    password: &str,
) -> Result<AuthenticatedUser> {
    let hash = auth::hash_password(password, bcrypt_cost)?;

    let mut props = Properties::new();
    props.insert("email".to_string(), json!(email));
    props.insert("username".to_string(), json!(username));
    props.insert("password".to_string(), json!(hash));
    props.insert("createdAt".to_string(), json!(Utc::now().to_rfc3339()));

    let node = store
        .create_node(Label::User, props)
        .map_err(conflict_or_storage)?;

    issue_for(tokens, &node)
}

/// Verify credentials and issue a token.
///
/// Unknown email and wrong password produce the same error so the endpoint
/// cannot be used to enumerate accounts.
pub fn authenticate<S: GraphStore>(
    store: &S,
    tokens: &TokenSigner,
    email: &str,
    password: &str,
) -> Result<AuthenticatedUser> {
    let node = match store.find_node(Label::User, "email", email) {
        Some(node) => node,
        None => {
            metrics::metrics().auth_failures.inc();
            return Err(invalid_credentials());
        }
    };

    let hash = node
        .str_property("password")
        .ok_or_else(|| Error::internal("user record missing password hash"))?;

    if !auth::verify_password(password, hash)? {
        metrics::metrics().auth_failures.inc();
        return Err(invalid_credentials());
    }

    issue_for(tokens, &node)
}

/// Fetch a user's profile
pub fn find_user<S: GraphStore>(store: &S, user_id: &str) -> Result<UserProfile> {
    let node = lookup(store, Label::User, user_id, "User not found")?;
    profile(&node)
}

/// Edit a user after re-verifying their current password
pub fn edit_user<S: GraphStore>(
    store: &S,
    tokens: &TokenSigner,
    bcrypt_cost: u32,
    user_id: &str,
    edit: &UserEdit,
) -> Result<AuthenticatedUser> {
    let node = lookup(store, Label::User, user_id, "User not found")?;

    let hash = node
        .str_property("password")
        .ok_or_else(|| Error::internal("user record missing password hash"))?;
    if !auth::verify_password(&edit.current_password, hash)? {
        return Err(Error::validation(
            "Invalid password",
            [(
                "currentPassword".to_string(),
                "does not match the current password".to_string(),
            )],
        ));
    }

    let mut props = Properties::new();
    if let Some(username) = &edit.new_username {
        props.insert("username".to_string(), json!(username));
    }
    if let Some(email) = &edit.new_email {
        props.insert("email".to_string(), json!(email));
    }
    if let Some(password) = &edit.new_password {
        let new_hash = auth::hash_password(password, bcrypt_cost)?;
        props.insert("password".to_string(), json!(new_hash));
    }

    let node = if props.is_empty() {
        node
    } else {
        store
            .update_node(node.id, props)
            .map_err(conflict_or_storage)?
    };

    issue_for(tokens, &node)
}

fn invalid_credentials() -> Error {
    Error::unauthorized("Invalid username or password")
}

fn conflict_or_storage(err: StorageError) -> Error {
    match err {
        StorageError::ConstraintViolation { key, .. } => {
            Error::conflict(format!("User with that {} already exists", key))
        }
        other => Error::Storage(other),
    }
}

fn profile(node: &Node) -> Result<UserProfile> {
    let email = node
        .str_property("email")
        .ok_or_else(|| Error::internal("user record missing email"))?;
    let username = node
        .str_property("username")
        .ok_or_else(|| Error::internal("user record missing username"))?;

    Ok(UserProfile {
        user_id: node.id.to_string(),
        email: email.to_string(),
        username: username.to_string(),
    })
}

fn issue_for(tokens: &TokenSigner, node: &Node) -> Result<AuthenticatedUser> {
    let profile = profile(node)?;
    let token = tokens.issue(&profile.user_id, &profile.email, &profile.username)?;
    metrics::metrics().tokens_issued.inc();

    Ok(AuthenticatedUser {
        sub: profile.user_id.clone(),
        user_id: profile.user_id,
        email: profile.email,
        username: profile.username,
        token,
    })
}
