use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    directory::DirectoryState,
    models::{Role, RoleClaim},
};

/// Claims
///
/// Payload of the access tokens issued by the development auth API.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the numeric user id.
    pub sub: i64,
    /// Role at issuance. Informational only: the extractor re-reads the directory.
    pub role: String,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// issue_token
///
/// Signs an HS256 access token for `user_id`, valid for `config.token_ttl_secs`.
pub fn issue_token(
    config: &AppConfig,
    user_id: i64,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        iat: now as usize,
        exp: (now + config.token_ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// ApiUser Extractor Result
///
/// Resolved identity of an authenticated API request. Handlers use it to load the
/// caller's record and to enforce the ADMIN-only endpoints.
#[derive(Debug, Clone)]
pub struct ApiUser {
    pub id: i64,
    pub role: Option<RoleClaim>,
}

impl ApiUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(|role| *role == Role::Admin)
    }
}

/// ApiUser Extractor Implementation
///
/// 1. Dependency Resolution: directory and config from the application state.
/// 2. Token Extraction: `Authorization: Bearer <jwt>`.
/// 3. Token Validation: signature and expiry.
/// 4. Directory Lookup: the user must still exist and be enabled; the role is
///    taken from the directory, not from the token.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for ApiUser
where
    S: Send + Sync,
    DirectoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let directory = DirectoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                _ => tracing::debug!(error = %e, "rejected invalid token"),
            }
            StatusCode::UNAUTHORIZED
        })?;

        let user = directory
            .get_user(token_data.claims.sub)
            .await
            .filter(|user| user.enabled)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(ApiUser {
            id: user.id,
            role: user.role,
        })
    }
}
