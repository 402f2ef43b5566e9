use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe; answers "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Exchanges credentials for an access token plus the profile fragment the
        // client commits to its session.
        .route("/auth/login", post(handlers::login))
        // POST /auth/register
        // Creates an account. Answers 409 when the email is taken.
        .route("/auth/register", post(handlers::register))
}
