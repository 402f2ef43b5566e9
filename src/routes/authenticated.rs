use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid token, whatever the role. The
/// `ApiUser` extractor rejects the request with 401 before the handler runs
/// when the token is missing, invalid, expired, or belongs to a disabled user.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        // The caller's own record, used by the client to refresh its profile.
        .route("/auth/me", get(handlers::get_me))
}
