//! User routes: signup, login, profile, edit

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::{AuthClaims, FieldErrors, Valid, Validate};
use crate::api::server::AppState;
use crate::core::error::Result;
use crate::domain::users::{self, UserEdit};

use super::authorize_self;

/// Body of `POST /api/users/signup`
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address, used for login
    pub email: String,
    /// Display name
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.require(
            "email",
            self.email.contains('@'),
            "must be a valid email address",
        );
        errors.require("username", !self.username.trim().is_empty(), "must not be empty");
        errors.require("password", !self.password.is_empty(), "must not be empty");
        errors.finish()
    }
}

/// Body of `POST /api/users/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.require("email", !self.email.is_empty(), "must not be empty");
        errors.require("password", !self.password.is_empty(), "must not be empty");
        errors.finish()
    }
}

/// Body of `PATCH /api/users/:id`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRequest {
    /// The current password, re-verified before any change applies
    pub current_password: String,
    /// Replacement username
    pub new_username: Option<String>,
    /// Replacement email
    pub new_email: Option<String>,
    /// Replacement password
    pub new_password: Option<String>,
}

impl Validate for EditUserRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.require(
            "currentPassword",
            !self.current_password.is_empty(),
            "must not be empty",
        );
        if let Some(email) = &self.new_email {
            errors.require("newEmail", email.contains('@'), "must be a valid email address");
        }
        if let Some(username) = &self.new_username {
            errors.require("newUsername", !username.trim().is_empty(), "must not be empty");
        }
        if let Some(password) = &self.new_password {
            errors.require("newPassword", !password.is_empty(), "must not be empty");
        }
        errors.finish()
    }
}

/// Register a new user; responds 201 with the profile and a session token
pub async fn signup(
    State(state): State<AppState>,
    Valid(req): Valid<SignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = users::register(
        &*state.store,
        &state.tokens,
        state.bcrypt_cost,
        &req.email,
        &req.username,
        &req.password,
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// Verify credentials and issue a session token
pub async fn login(
    State(state): State<AppState>,
    Valid(req): Valid<LoginRequest>,
) -> Result<Json<Value>> {
    let user = users::authenticate(&*state.store, &state.tokens, &req.email, &req.password)?;
    Ok(Json(json!({ "user": user })))
}

/// A user's own profile; 403 for anyone else's
pub async fn user_info(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    authorize_self(&claims, &id)?;
    let user = users::find_user(&*state.store, &id)?;
    Ok(Json(json!({ "user": user })))
}

/// Edit a user's own profile after re-verifying the current password
pub async fn edit_user(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<String>,
    Valid(req): Valid<EditUserRequest>,
) -> Result<Json<Value>> {
    authorize_self(&claims, &id)?;

    let edit = UserEdit {
        current_password: req.current_password,
        new_username: req.new_username,
        new_email: req.new_email,
        new_password: req.new_password,
    };
    let user = users::edit_user(&*state.store, &state.tokens, state.bcrypt_cost, &id, &edit)?;

    Ok(Json(json!({ "user": user })))
}
