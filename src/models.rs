use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Roles ---

/// Role
///
/// The three authorization roles of the portal. Each role owns exactly one
/// dashboard; the wire form is the upper-case name (`"ADMIN"`, `"DOCTOR"`, `"PATIENT"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Patient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Patient => "PATIENT",
        }
    }

    /// Strict parse of the wire form. Anything else is not a role.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "DOCTOR" => Some(Role::Doctor),
            "PATIENT" => Some(Role::Patient),
            _ => None,
        }
    }

    /// Landing route of the dashboard owned by this role.
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Doctor => "/doctor/dashboard",
            Role::Patient => "/patient/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RoleClaim
///
/// A role as it was found on the wire or in durable storage. The server (or a
/// stale storage entry) may hand us a value outside the three known roles; it is
/// kept verbatim instead of being dropped so the authorizer can fail closed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleClaim {
    Known(Role),
    Unrecognized(String),
}

impl RoleClaim {
    pub fn known(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleClaim::Known(role) => role.as_str(),
            RoleClaim::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for RoleClaim {
    fn from(value: String) -> Self {
        match Role::parse(&value) {
            Some(role) => RoleClaim::Known(role),
            None => RoleClaim::Unrecognized(value),
        }
    }
}

impl From<RoleClaim> for String {
    fn from(claim: RoleClaim) -> Self {
        claim.as_str().to_string()
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl PartialEq<Role> for RoleClaim {
    fn eq(&self, other: &Role) -> bool {
        self.known() == Some(*other)
    }
}

// --- Session ---

/// Identity
///
/// Display profile of the signed-in user. Never consulted for access control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Session
///
/// The client-held record of an authenticated user. A session without a token
/// (or with an empty one) is unauthenticated whatever its role and identity say.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<RoleClaim>,
    pub identity: Option<Identity>,
}

impl Session {
    /// Builds the session committed after a successful login.
    pub fn from_login(response: &LoginResponse) -> Self {
        Self {
            token: Some(response.access_token.clone()),
            role: Some(response.role.clone()),
            identity: Some(Identity {
                first_name: response.first_name.clone(),
                last_name: response.last_name.clone(),
                email: response.email.clone(),
            }),
        }
    }

    /// The bearer token, with the empty string treated as absent.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// CurrentUserSnapshot
///
/// JSON shape persisted under the `current_user` durable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserSnapshot {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<RoleClaim>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterUserRequest
///
/// Body of `POST /auth/register`. The password is only passed through to the
/// auth API and never persisted or logged by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl RegisterUserRequest {
    pub const MIN_NAME_LEN: usize = 2;
    pub const MIN_PASSWORD_LEN: usize = 6;

    /// Field checks shared by the client and the API. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().chars().count() < Self::MIN_NAME_LEN {
            return Err("First name must be at least 2 characters".to_string());
        }
        if self.last_name.trim().chars().count() < Self::MIN_NAME_LEN {
            return Err("Last name must be at least 2 characters".to_string());
        }
        if !is_plausible_email(&self.email) {
            return Err("Email address is not valid".to_string());
        }
        if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters".to_string());
        }
        Ok(())
    }
}

/// `local@domain` with both sides non-empty and no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// UpdateUserRequest
///
/// Partial update payload for `PUT /auth/users/{id}`. Only provided fields are sent.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// --- Response Payloads (Output Schemas) ---

/// LoginResponse
///
/// Success body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    pub email: String,
    #[ts(type = "string")]
    #[schema(value_type = String)]
    pub role: RoleClaim,
    pub first_name: String,
    pub last_name: String,
}

/// User
///
/// The user record returned by `/auth/me`, `/auth/users` and `/auth/register`.
/// `role` is optional because a partial profile payload may omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub role: Option<RoleClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub last_login: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool {
    true
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// ErrorResponse
///
/// Body carried by every non-2xx answer of the auth API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
