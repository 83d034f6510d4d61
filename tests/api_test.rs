//! End-to-end tests driving the HTTP router
//!
//! Each test builds a fresh in-memory store and exercises routes exactly the
//! way the web client does: JSON bodies in, enveloped JSON out, bearer
//! tokens in the Authorization header.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use agnosis::api::{create_app, AppState};
use agnosis::auth::TokenSigner;
use agnosis::storage::MemStore;

const SECRET: &str = "test-secret";

// Low work factor keeps the suite fast
const BCRYPT_COST: u32 = 4;

fn test_app() -> Router {
    let state = AppState {
        store: Arc::new(MemStore::new()),
        tokens: Arc::new(TokenSigner::new(SECRET, Duration::from_secs(3600))),
        bcrypt_cost: BCRYPT_COST,
        metrics_enabled: true,
    };
    create_app(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Signs up a user and returns (user_id, token)
async fn signup(app: &Router, email: &str, username: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/signup",
        None,
        Some(json!({ "email": email, "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    let user = &body["user"];
    (
        user["userId"].as_str().unwrap().to_string(),
        user["token"].as_str().unwrap().to_string(),
    )
}

/// Posts an idea and returns its id
async fn post_idea(app: &Router, token: &str, url: &str, description: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/ideas",
        Some(token),
        Some(json!({ "url": url, "description": description })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "posting idea failed: {body}");
    body["idea"]["ideaId"].as_str().unwrap().to_string()
}

async fn react(app: &Router, token: &str, idea_id: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/ideas/{idea_id}/react"),
        Some(token),
        Some(body),
    )
    .await
}

#[tokio::test]
async fn signup_returns_user_with_token() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/signup",
        None,
        Some(json!({ "email": "user1@user1.com", "username": "user1", "password": "password1" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "user1@user1.com");
    assert_eq!(body["user"]["sub"], body["user"]["userId"]);
    assert!(body["user"]["token"].as_str().is_some());
    assert!(!body.to_string().contains("password"));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = test_app();
    signup(&app, "user1@user1.com", "user1", "password1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/signup",
        None,
        Some(json!({ "email": "user1@user1.com", "username": "other", "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["msg"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn malformed_signup_rejected_with_field_errors() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/signup",
        None,
        Some(json!({ "email": "not-an-email", "username": "", "password": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].as_str().is_some());
    assert!(body["errors"]["username"].as_str().is_some());
}

#[tokio::test]
async fn login_verifies_credentials() {
    let app = test_app();
    signup(&app, "user1@user1.com", "user1", "password1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "user1@user1.com", "password": "password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"]["token"].as_str().is_some());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "user1@user1.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Invalid username or password");
}

#[tokio::test]
async fn user_info_requires_token_and_self() {
    let app = test_app();
    let (user_id, token) = signup(&app, "user1@user1.com", "user1", "password1").await;
    let (_, other_token) = signup(&app, "user2@user2.com", "user2", "password2").await;

    let uri = format!("/api/users/{user_id}");

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "user1");
    assert!(!body.to_string().contains("password"));

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Missing Authorization Header");

    let (status, body) = send(&app, Method::GET, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "You are not authorized to view this resource");
}

#[tokio::test]
async fn expired_and_garbage_tokens_rejected() {
    let app = test_app();
    let (user_id, _) = signup(&app, "user1@user1.com", "user1", "password1").await;
    let uri = format!("/api/users/{user_id}");

    let now = chrono::Utc::now().timestamp();
    let stale = agnosis::auth::Claims {
        sub: user_id.clone(),
        user_id: user_id.clone(),
        email: "user1@user1.com".to_string(),
        username: "user1".to_string(),
        iat: now - 7200,
        nbf: now - 7200,
        exp: now - 3600,
    };
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &stale,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = send(&app, Method::GET, &uri, Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token has expired");

    let (status, _) = send(&app, Method::GET, &uri, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn edit_user_checks_current_password() {
    let app = test_app();
    let (user_id, token) = signup(&app, "user1@user1.com", "user1", "password1").await;
    let uri = format!("/api/users/{user_id}");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "currentPassword": "wrong", "newUsername": "updated" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({
            "currentPassword": "password1",
            "newUsername": "updated",
            "newPassword": "password2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "updated");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "user1@user1.com", "password": "password2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn posting_an_idea_requires_a_description() {
    let app = test_app();
    let (_, token) = signup(&app, "user1@user1.com", "user1", "password1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ideas",
        Some(&token),
        Some(json!({ "url": "https://example.test" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().is_some());
}

#[tokio::test]
async fn random_idea_is_public() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/ideas/random", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["idea"].is_null());

    let (_, token) = signup(&app, "user1@user1.com", "user1", "password1").await;
    post_idea(&app, &token, "https://example.test", "an idea").await;

    let (status, body) = send(&app, Method::GET, "/api/ideas/random", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"]["url"], "https://example.test");
}

#[tokio::test]
async fn unseen_ideas_run_out_with_a_message() {
    let app = test_app();
    let (_, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, reader) = signup(&app, "r@x.com", "reader", "pw").await;
    post_idea(&app, &poster, "https://one.test", "one").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/random-unseen",
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"]["description"], "one");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/random-unseen",
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "We are all out of ideas you haven't seen before.");
}

#[tokio::test]
async fn reacting_records_and_replaces() {
    let app = test_app();
    let (_, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, reader) = signup(&app, "r@x.com", "reader", "pw").await;
    let idea_id = post_idea(&app, &poster, "https://one.test", "one").await;

    let (status, body) = react(
        &app,
        &reader,
        &idea_id,
        json!({ "type": "like", "agreement": -2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reaction"]["agreement"], -2);
    assert_eq!(body["reaction"]["type"], "LIKES");

    let (status, body) = react(&app, &reader, &idea_id, json!({ "type": "dislike" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reaction"]["type"], "DISLIKES");

    // The replacement left exactly one reaction
    let (_, body) = send(&app, Method::GET, "/api/ideas/disliked", Some(&reader), None).await;
    assert_eq!(body["ideas"].as_array().unwrap().len(), 1);
    let (_, body) = send(&app, Method::GET, "/api/ideas/liked", Some(&reader), None).await;
    assert!(body["ideas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reacting_to_a_missing_idea_is_unsavable() {
    let app = test_app();
    let (_, token) = signup(&app, "r@x.com", "reader", "pw").await;

    let (status, body) = react(
        &app,
        &token,
        "no-such-idea",
        json!({ "type": "like", "agreement": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Reaction could not be saved.");
}

#[tokio::test]
async fn reactions_mark_ideas_viewed() {
    let app = test_app();
    let (_, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, reader) = signup(&app, "r@x.com", "reader", "pw").await;
    let idea_id = post_idea(&app, &poster, "https://one.test", "one").await;

    react(&app, &reader, &idea_id, json!({ "type": "dislike" })).await;

    let (status, body) = send(&app, Method::GET, "/api/ideas/viewed", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    let ideas = body["ideas"].as_array().unwrap();
    assert_eq!(ideas.len(), 1);
    assert_eq!(ideas[0]["ideaId"].as_str().unwrap(), idea_id);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/viewed-with-relationships",
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ideas = body["ideas"].as_array().unwrap();
    assert_eq!(ideas[0]["userReaction"], "DISLIKES");
    assert_eq!(ideas[0]["allReactions"], 1);
}

#[tokio::test]
async fn agreeable_and_disagreeable_follow_similar_users() {
    let app = test_app();
    let (_, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, me) = signup(&app, "me@x.com", "me", "pw").await;
    let (_, kindred) = signup(&app, "k@x.com", "kindred", "pw").await;
    let (_, opposite) = signup(&app, "o@x.com", "opposite", "pw").await;

    let shared = post_idea(&app, &poster, "https://shared.test", "shared").await;
    let nice = post_idea(&app, &poster, "https://nice.test", "nice").await;
    let nasty = post_idea(&app, &poster, "https://nasty.test", "nasty").await;

    react(&app, &me, &shared, json!({ "type": "like", "agreement": 2 })).await;
    react(&app, &kindred, &shared, json!({ "type": "like", "agreement": 2 })).await;
    react(&app, &opposite, &shared, json!({ "type": "like", "agreement": -2 })).await;
    react(&app, &kindred, &nice, json!({ "type": "like", "agreement": 3 })).await;
    react(&app, &opposite, &nasty, json!({ "type": "like", "agreement": 3 })).await;

    let (status, body) = send(&app, Method::GET, "/api/ideas/agreeable", Some(&me), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"]["ideaId"].as_str().unwrap(), nice);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/disagreeable",
        Some(&me),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"]["ideaId"].as_str().unwrap(), nasty);

    // Both were just served, so the well is dry now
    let (status, body) = send(&app, Method::GET, "/api/ideas/agreeable", Some(&me), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "We are all out of nice ideas.");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/disagreeable",
        Some(&me),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "We are all out of ideas for you to disagree with.");
}

#[tokio::test]
async fn idea_details_with_reactions() {
    let app = test_app();
    let (_, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, reader) = signup(&app, "r@x.com", "reader", "pw").await;
    let idea_id = post_idea(&app, &poster, "https://one.test", "one").await;
    react(&app, &reader, &idea_id, json!({ "type": "like", "agreement": 2 })).await;

    let uri = format!("/api/ideas/{idea_id}?with-reactions=true&with-user-reaction=true");
    let (status, body) = send(&app, Method::GET, &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idea"]["allReactions"], 1);
    assert_eq!(body["idea"]["allAgreement"], 2);
    assert_eq!(body["idea"]["userReaction"], "LIKES");

    let uri = format!("/api/ideas/{idea_id}/reactions");
    let (status, body) = send(&app, Method::GET, &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reactions"]["userAgreement"], 2);
    assert_eq!(body["reactions"]["allReactions"], 1);
}

#[tokio::test]
async fn only_posters_delete_their_ideas() {
    let app = test_app();
    let (user_id, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, other) = signup(&app, "o@x.com", "other", "pw").await;
    let idea_id = post_idea(&app, &poster, "https://one.test", "one").await;

    let uri = format!("/api/ideas/{idea_id}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&poster), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"].as_str().unwrap(), idea_id);

    let uri = format!("/api/ideas/user/{user_id}");
    let (_, body) = send(&app, Method::GET, &uri, Some(&poster), None).await;
    assert!(body["ideas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn posted_ideas_are_private_to_their_user() {
    let app = test_app();
    let (user_id, poster) = signup(&app, "p@x.com", "poster", "pw").await;
    let (_, other) = signup(&app, "o@x.com", "other", "pw").await;
    post_idea(&app, &poster, "https://one.test", "one").await;

    let uri = format!("/api/ideas/user/{user_id}");

    let (status, body) = send(&app, Method::GET, &uri, Some(&poster), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ideas"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "You are not authorized to view this resource");
}

#[tokio::test]
async fn search_matches_descriptions() {
    let app = test_app();
    let (_, token) = signup(&app, "p@x.com", "poster", "pw").await;
    post_idea(&app, &token, "https://ca.test", "Cellular Automata and life").await;
    post_idea(&app, &token, "https://other.test", "Something else").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/ideas/search?q=cellular",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ideas"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sources_merge_by_name() {
    let app = test_app();
    let (_, token) = signup(&app, "p@x.com", "poster", "pw").await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/api/sources",
        Some(&token),
        Some(json!({ "name": "Astral Codex Ten" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, second) = send(
        &app,
        Method::POST,
        "/api/sources",
        Some(&token),
        Some(json!({ "name": "Astral Codex Ten" })),
    )
    .await;
    assert_eq!(first["source"]["sourceId"], second["source"]["sourceId"]);

    let (status, body) = send(&app, Method::GET, "/api/sources", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ideas_carry_their_source() {
    let app = test_app();
    let (_, token) = signup(&app, "p@x.com", "poster", "pw").await;

    let (_, source) = send(
        &app,
        Method::POST,
        "/api/sources",
        Some(&token),
        Some(json!({ "name": "The Atlantic" })),
    )
    .await;
    let source_id = source["source"]["sourceId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ideas",
        Some(&token),
        Some(json!({
            "url": "https://example.test",
            "description": "sourced",
            "sourceId": source_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["idea"]["sourceId"].as_str().unwrap(), source_id);
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("agnosis_http_requests_total"));
}
