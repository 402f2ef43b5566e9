use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Client-side auth core: durable storage, session, gateway, authorization.
pub mod authorizer;
pub mod error;
pub mod gateway;
pub mod models;
pub mod navigation;
pub mod portal;
pub mod session;
pub mod storage;

// Development auth API (the external collaborator, runnable in-process).
pub mod auth;
pub mod config;
pub mod directory;
pub mod handlers;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::ApiUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use authorizer::{AccessState, Decision, RouteAuthorizer, RouteRequest};
pub use config::AppConfig;
pub use directory::{DirectoryState, InMemoryDirectory};
pub use error::{AuthError, ErrorKind, StorageError};
pub use gateway::AuthGateway;
pub use navigation::Navigator;
pub use portal::Portal;
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, StorageState};

/// ApiDoc
///
/// OpenAPI document of the development auth API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::register, handlers::get_me, handlers::list_users,
        handlers::update_user, handlers::delete_user, handlers::toggle_user_status
    ),
    components(
        schemas(
            models::Role, models::LoginRequest, models::LoginResponse,
            models::RegisterUserRequest, models::UpdateUserRequest, models::User,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "med-portal", description = "Medical portal auth API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared state of the development auth API: the user directory and the
/// immutable configuration (token secret and lifetime).
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryState,
    pub config: AppConfig,
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(app_state: &AppState) -> DirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects requests without a valid bearer token before routing reaches the
/// handler: extracting `ApiUser` fails with 401 on any token problem.
async fn auth_middleware(_caller: ApiUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the development auth API: public routes, token-protected routes,
/// admin routes, Swagger UI, and the request-id / tracing / CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let protected = authenticated::authenticated_routes()
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state)
        // Request id assignment, the traced span, then the id echoed back on
        // the response. CORS wraps the whole stack.
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER)),
        )
        .layer(cors)
}

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "portal_api",
        method = %request.method(),
        path = %request.uri().path(),
        request_id,
    )
}
