use crate::{
    AppState,
    auth::{ApiUser, issue_token},
    directory::DirectoryError,
    models::{
        ErrorResponse, LoginRequest, LoginResponse, RegisterUserRequest, UpdateUserRequest,
        User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

// --- Error Mapping ---

/// ApiError
///
/// Non-2xx answer of the auth API. Always rendered as `{"message": ...}` so the
/// client can show the server's wording.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Administrator role required")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            message: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound => ApiError::new(StatusCode::NOT_FOUND, "User not found"),
            DirectoryError::DuplicateEmail => {
                ApiError::new(StatusCode::CONFLICT, "Email already in use")
            }
        }
    }
}

fn require_admin(caller: &ApiUser) -> Result<(), ApiError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

// --- Handlers ---

/// login
///
/// [Public Route] Verifies credentials and issues an access token.
/// Unknown email, wrong password and disabled accounts all answer 401.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Rejected", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password");

    let stored = state
        .directory
        .find_by_email(&payload.email)
        .await
        .ok_or_else(invalid)?;
    if stored.password != payload.password {
        return Err(invalid());
    }
    if !stored.user.enabled {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Account is disabled"));
    }

    let user = stored.user;
    let role = user.role.clone().ok_or_else(|| {
        tracing::error!(user_id = user.id, "directory user without role");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "User has no role")
    })?;

    let access_token = issue_token(&state.config, user.id, role.as_str()).map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Token signing failed")
    })?;
    state.directory.record_login(user.id).await;
    tracing::info!(user_id = user.id, role = role.as_str(), "token issued");

    Ok(Json(LoginResponse {
        access_token,
        refresh_token: None,
        token_type: "Bearer".to_string(),
        expires_in: state.config.token_ttl_secs,
        email: user.email,
        role,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// register
///
/// [Public Route] Creates an account. Does not sign the user in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Duplicate email", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload
        .validate()
        .map_err(|message| ApiError::new(StatusCode::BAD_REQUEST, message))?;

    let user = state.directory.create_user(payload).await?;
    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// get_me
///
/// [Authenticated Route] The caller's own user record.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    caller: ApiUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .directory
        .get_user(caller.id)
        .await
        .ok_or(DirectoryError::NotFound)?;
    Ok(Json(user))
}

/// list_users
///
/// [Admin Route] Every account in the directory.
#[utoipa::path(
    get,
    path = "/auth/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
pub async fn list_users(
    caller: ApiUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_admin(&caller)?;
    Ok(Json(state.directory.list_users().await))
}

/// update_user
///
/// [Admin Route] Partial update of an account.
#[utoipa::path(
    put,
    path = "/auth/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 409, description = "Duplicate email", body = ErrorResponse)
    )
)]
pub async fn update_user(
    caller: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    require_admin(&caller)?;
    let user = state.directory.update_user(id, payload).await?;
    Ok(Json(user))
}

/// delete_user
///
/// [Admin Route] Removes an account. An administrator cannot delete itself.
#[utoipa::path(
    delete,
    path = "/auth/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Self deletion", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    caller: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    if caller.id == id {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Administrators cannot delete their own account",
        ));
    }
    if state.directory.delete_user(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DirectoryError::NotFound.into())
    }
}

/// toggle_user_status
///
/// [Admin Route] Enables a disabled account or disables an enabled one.
/// Disabled accounts can no longer sign in and their tokens stop working.
#[utoipa::path(
    patch,
    path = "/auth/users/{id}/toggle-status",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Toggled"),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn toggle_user_status(
    caller: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    if state.directory.toggle_status(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DirectoryError::NotFound.into())
    }
}
