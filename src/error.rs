//! Error types of the client-side auth core.
//!
//! Every expected failure of the Auth Gateway is a typed `AuthError`; the
//! Session Store never surfaces `StorageError` past its boundary.

use thiserror::Error;

/// Coarse failure taxonomy used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response could be obtained from the server.
    NetworkUnreachable,
    /// The server answered with a 4xx rejection.
    Rejected,
    /// The response body did not have the expected shape.
    Malformed,
    Unknown,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("cannot reach the authentication server")]
    ServerUnreachable,

    #[error("invalid credentials{}", fmt_detail(.0))]
    InvalidCredentials(Option<String>),

    #[error("registration rejected{}", fmt_detail(.0))]
    ValidationFailed(Option<String>),

    #[error("an account already exists for this email")]
    DuplicateEmail,

    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("access denied by the server")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The login was abandoned (cancelled, superseded or logged out) before its
    /// response arrived; the response was dropped.
    #[error("request superseded by a newer navigation")]
    Superseded,

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::ServerUnreachable => ErrorKind::NetworkUnreachable,
            AuthError::InvalidCredentials(_)
            | AuthError::ValidationFailed(_)
            | AuthError::DuplicateEmail
            | AuthError::NotAuthenticated
            | AuthError::Forbidden
            | AuthError::NotFound => ErrorKind::Rejected,
            AuthError::Malformed(_) => ErrorKind::Malformed,
            AuthError::Superseded | AuthError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Message shown to the user. Prefers the server's own wording for rejections.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::ServerUnreachable => {
                "Unable to reach the server. Check that the backend is running.".to_string()
            }
            AuthError::InvalidCredentials(Some(message))
            | AuthError::ValidationFailed(Some(message)) => message.clone(),
            AuthError::InvalidCredentials(None) => "Incorrect email or password.".to_string(),
            AuthError::ValidationFailed(None) => {
                "Registration data was rejected. Check the form and try again.".to_string()
            }
            AuthError::DuplicateEmail => "An account already exists for this email.".to_string(),
            AuthError::NotAuthenticated => "Your session has ended. Please sign in.".to_string(),
            AuthError::Forbidden => "You are not allowed to perform this action.".to_string(),
            AuthError::NotFound => "The requested record no longer exists.".to_string(),
            AuthError::Malformed(_) | AuthError::Unknown(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            AuthError::Superseded => String::new(),
        }
    }
}

/// Failures of a durable key/value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not a valid key/value document: {0}")]
    Corrupt(#[from] serde_json::Error),
}
