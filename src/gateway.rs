use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    authorizer::Decision,
    error::AuthError,
    models::{
        ErrorResponse, LoginRequest, LoginResponse, RegisterUserRequest, Session,
        UpdateUserRequest, User,
    },
    session::SessionStore,
};

/// AuthGateway
///
/// Client of the external auth API. Owns no session state of its own: every
/// successful login or profile refresh is committed to the shared Session Store
/// before the caller sees the result, so a redirect decided right after `login`
/// returns always reads the new session.
///
/// Each login takes a ticket. `cancel_pending`, `logout` and any newer login
/// advance the ticket, and a response holding a stale ticket is dropped with
/// `AuthError::Superseded` instead of resurrecting an abandoned session.
pub struct AuthGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    ticket: Mutex<u64>,
}

impl AuthGateway {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            ticket: Mutex::new(0),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current_ticket(&self) -> MutexGuard<'_, u64> {
        self.ticket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_ticket(&self) -> u64 {
        let mut ticket = self.current_ticket();
        *ticket += 1;
        *ticket
    }

    // --- Session flows ---

    /// login
    ///
    /// POST /auth/login. On success the full session (token, role, identity) is
    /// committed before this returns.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let ticket = self.next_ticket();
        tracing::info!(email, "login attempt");

        let result = self.request_login(email, password).await;

        // Ticket check and commit happen under the same lock as `cancel_pending`.
        let current = self.current_ticket();
        if *current != ticket {
            tracing::info!(email, "dropping response of an abandoned login");
            return Err(AuthError::Superseded);
        }

        let response = result.inspect_err(|e| {
            tracing::warn!(email, error = %e, "login failed");
        })?;
        self.session.set(Session::from_login(&response));
        drop(current);

        tracing::info!(email, role = response.role.as_str(), "login committed");
        Ok(response)
    }

    async fn request_login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(if status.is_client_error() {
                AuthError::InvalidCredentials(message)
            } else {
                AuthError::Unknown(format!("login answered {status}"))
            });
        }

        let login: LoginResponse = decode(response).await?;
        if login.access_token.is_empty() {
            return Err(AuthError::Malformed("login response without accessToken".into()));
        }
        Ok(login)
    }

    /// Invalidates the in-flight login, if any.
    pub fn cancel_pending(&self) {
        self.next_ticket();
    }

    /// logout
    ///
    /// Clears the session synchronously and returns the navigation to the login
    /// page. Works offline; calling it twice is harmless.
    pub fn logout(&self) -> Decision {
        self.cancel_pending();
        self.session.clear();
        tracing::info!("logged out");
        Decision::RedirectToLogin { return_url: None }
    }

    /// register
    ///
    /// POST /auth/register. Registration does not sign the user in; the Session
    /// Store is left untouched.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<User, AuthError> {
        tracing::info!(email = %request.email, role = %request.role, "registration attempt");
        request
            .validate()
            .map_err(|message| AuthError::ValidationFailed(Some(message)))?;

        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::CONFLICT => AuthError::DuplicateEmail,
                s if s.is_client_error() => AuthError::ValidationFailed(message),
                s => AuthError::Unknown(format!("register answered {s}")),
            });
        }

        decode(response).await
    }

    /// refresh_profile
    ///
    /// GET /auth/me and merge the profile into the current session. A payload
    /// without a role keeps the role already known.
    ///
    /// The refresh belongs to the session it started under: when a logout or
    /// another login happened while it was in flight, the profile is dropped
    /// with `AuthError::Superseded`.
    pub async fn refresh_profile(&self) -> Result<User, AuthError> {
        let ticket = *self.current_ticket();
        let token = self.session.token().ok_or(AuthError::NotAuthenticated)?;

        let request = self.client.get(self.url("/auth/me"));
        let response = self.send_with_token(request, &token).await?;
        let user: User = decode(response).await?;

        let current = self.current_ticket();
        if *current != ticket || self.session.token().as_deref() != Some(token.as_str()) {
            tracing::info!(email = %user.email, "dropping profile of an abandoned session");
            return Err(AuthError::Superseded);
        }
        self.session.merge_profile(&user);
        drop(current);

        Ok(user)
    }

    // --- Admin user management ---

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let response = self.send_authorized(self.client.get(self.url("/auth/users"))).await?;
        decode(response).await
    }

    pub async fn update_user(&self, id: i64, changes: &UpdateUserRequest) -> Result<User, AuthError> {
        let request = self
            .client
            .put(self.url(&format!("/auth/users/{id}")))
            .json(changes);
        let response = self.send_authorized(request).await?;
        decode(response).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AuthError> {
        let request = self.client.delete(self.url(&format!("/auth/users/{id}")));
        self.send_authorized(request).await.map(|_| ())
    }

    pub async fn toggle_user_status(&self, id: i64) -> Result<(), AuthError> {
        let request = self
            .client
            .patch(self.url(&format!("/auth/users/{id}/toggle-status")));
        self.send_authorized(request).await.map(|_| ())
    }

    /// Attaches the bearer token and maps non-2xx answers onto `AuthError`.
    async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        let token = self.session.token().ok_or(AuthError::NotAuthenticated)?;
        self.send_with_token(request, &token).await
    }

    async fn send_with_token(
        &self,
        request: RequestBuilder,
        token: &str,
    ) -> Result<Response, AuthError> {
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        Err(match status {
            StatusCode::UNAUTHORIZED => AuthError::NotAuthenticated,
            StatusCode::FORBIDDEN => AuthError::Forbidden,
            StatusCode::NOT_FOUND => AuthError::NotFound,
            StatusCode::CONFLICT => AuthError::DuplicateEmail,
            s if s.is_client_error() => AuthError::ValidationFailed(message),
            s => AuthError::Unknown(format!("server answered {s}")),
        })
    }
}

// --- Boundary helpers ---

/// Failures before any HTTP status was obtained.
fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        AuthError::ServerUnreachable
    } else if e.is_decode() || e.is_body() {
        AuthError::Malformed(e.to_string())
    } else {
        AuthError::Unknown(e.to_string())
    }
}

/// Decodes a success body, failing with `Malformed` when it has the wrong shape.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(e.to_string()))
}

/// The server's `message`, when the rejection body carries one.
async fn error_message(response: Response) -> Option<String> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice::<ErrorResponse>(&bytes)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
}
