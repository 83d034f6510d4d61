//! HTTP server for the Agnosis API

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenSigner;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::storage::SharedStorage;
use crate::system::metrics;

use super::handlers;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// The graph store
    pub store: SharedStorage,
    /// Session token signer and verifier
    pub tokens: Arc<TokenSigner>,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Whether `/metrics` is served
    pub metrics_enabled: bool,
}

impl AppState {
    /// Build state from validated configuration and a storage handle
    pub fn new(config: &Config, store: SharedStorage) -> Result<Self> {
        let ttl = config.token_ttl()?;
        Ok(Self {
            store,
            tokens: Arc::new(TokenSigner::new(&config.auth.jwt_secret, ttl)),
            bcrypt_cost: config.auth.bcrypt_cost,
            metrics_enabled: config.metrics.enable_prometheus,
        })
    }
}

/// Creates the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        // User routes
        .route("/api/users/signup", post(handlers::users::signup))
        .route("/api/users/login", post(handlers::users::login))
        .route("/api/users/:id", get(handlers::users::user_info))
        .route("/api/users/:id", patch(handlers::users::edit_user))
        // Idea routes
        .route("/api/ideas", post(handlers::ideas::post_idea))
        .route("/api/ideas/random", get(handlers::ideas::random_idea))
        .route(
            "/api/ideas/random-unseen",
            get(handlers::ideas::random_unseen_idea),
        )
        .route("/api/ideas/popular", get(handlers::ideas::popular_idea))
        .route("/api/ideas/agreeable", get(handlers::ideas::agreeable_idea))
        .route(
            "/api/ideas/disagreeable",
            get(handlers::ideas::disagreeable_idea),
        )
        .route("/api/ideas/search", get(handlers::ideas::search_ideas))
        .route("/api/ideas/viewed", get(handlers::ideas::viewed_ideas))
        .route(
            "/api/ideas/viewed-with-relationships",
            get(handlers::ideas::viewed_ideas_with_relationships),
        )
        .route("/api/ideas/liked", get(handlers::ideas::liked_ideas))
        .route("/api/ideas/disliked", get(handlers::ideas::disliked_ideas))
        .route(
            "/api/ideas/user/:user_id",
            get(handlers::ideas::posted_by_user),
        )
        .route("/api/ideas/:id/react", post(handlers::ideas::react_to_idea))
        .route(
            "/api/ideas/:id/reactions",
            get(handlers::ideas::idea_reactions),
        )
        .route("/api/ideas/:id", get(handlers::ideas::idea_details))
        .route("/api/ideas/:id", delete(handlers::ideas::delete_idea))
        // Source routes
        .route("/api/sources", get(handlers::sources::list_sources))
        .route("/api/sources", post(handlers::sources::add_source))
        // System routes
        .route("/api/health", get(handlers::system::health_check))
        .route("/metrics", get(handlers::system::metrics_export))
        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(count_requests)),
        )
        // Add shared state
        .with_state(state)
}

async fn count_requests(
    req: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    metrics::metrics().http_requests.inc();
    next.run(req).await
}

/// Start the HTTP server and run until a shutdown signal arrives
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    tracing::info!("Starting Agnosis API server on {}", addr);

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => tracing::error!(%error, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
