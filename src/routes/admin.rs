use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, put},
};

/// Admin Router Module
///
/// User management for the admin dashboard. Every handler authenticates the
/// caller through `ApiUser` and answers 403 unless the caller's role is ADMIN.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/users
        .route("/auth/users", get(handlers::list_users))
        // PUT/DELETE /auth/users/{id}
        .route(
            "/auth/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // PATCH /auth/users/{id}/toggle-status
        // Disabling an account also invalidates its outstanding tokens.
        .route(
            "/auth/users/{id}/toggle-status",
            patch(handlers::toggle_user_status),
        )
}
