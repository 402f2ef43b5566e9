use std::sync::Arc;

use crate::{
    models::{Role, RoleClaim},
    session::SessionStore,
};

pub const LOGIN_ROUTE: &str = "/auth/login";

/// Where the authorizer places a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unauthenticated,
    AuthorizedSameRole,
    AuthorizedWrongRole,
}

/// RouteRequest
///
/// One attempted navigation, supplied by the navigation layer. `required_role`
/// is `None` for guarded routes open to any signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub required_role: Option<Role>,
    pub target_path: String,
}

impl RouteRequest {
    pub fn new(required_role: Option<Role>, target_path: impl Into<String>) -> Self {
        Self {
            required_role,
            target_path: target_path.into(),
        }
    }
}

/// Decision
///
/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Admit,
    /// Unauthenticated, or role unresolvable. `return_url` carries the path the
    /// caller was trying to reach so login can resume it.
    RedirectToLogin { return_url: Option<String> },
    /// Signed in with a different role: send the caller to its own dashboard.
    RedirectToHome(Role),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit)
    }

    /// Redirect location, `None` when admitted.
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Admit => None,
            Decision::RedirectToLogin { return_url: None } => Some(LOGIN_ROUTE.to_string()),
            Decision::RedirectToLogin {
                return_url: Some(url),
            } => Some(login_url_with_return(url)),
            Decision::RedirectToHome(role) => Some(role.home_route().to_string()),
        }
    }
}

/// `/auth/login?returnUrl=<path>` with the path percent-encoded.
pub fn login_url_with_return(return_url: &str) -> String {
    format!(
        "{LOGIN_ROUTE}?returnUrl={}",
        urlencoding::encode(return_url)
    )
}

/// RouteAuthorizer
///
/// Consulted before entering every guarded view. Reads the Session Store on each
/// call and never caches a verdict, since the role may change within a session.
#[derive(Clone)]
pub struct RouteAuthorizer {
    session: Arc<SessionStore>,
}

impl RouteAuthorizer {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// classify
    ///
    /// Places the caller relative to `required_role`. A guarded route without a
    /// role counts as same-role for any signed-in caller.
    pub fn classify(&self, required_role: Option<Role>) -> AccessState {
        if !self.session.is_authenticated() {
            return AccessState::Unauthenticated;
        }
        match (required_role, self.session.role_of()) {
            (None, _) => AccessState::AuthorizedSameRole,
            (Some(required), Some(actual)) if actual == required => {
                AccessState::AuthorizedSameRole
            }
            _ => AccessState::AuthorizedWrongRole,
        }
    }

    /// authorize
    ///
    /// 1. no token: redirect to login carrying the target path;
    /// 2. no required role: admit;
    /// 3. matching role: admit;
    /// 4. otherwise redirect to the caller's own home, or to login when the
    ///    caller's role is missing or unrecognized.
    pub fn authorize(&self, request: &RouteRequest) -> Decision {
        let decision = match self.classify(request.required_role) {
            AccessState::Unauthenticated => Decision::RedirectToLogin {
                return_url: Some(request.target_path.clone()),
            },
            AccessState::AuthorizedSameRole => Decision::Admit,
            AccessState::AuthorizedWrongRole => match self.session.role_of() {
                Some(RoleClaim::Known(actual)) => Decision::RedirectToHome(actual),
                Some(RoleClaim::Unrecognized(raw)) => {
                    tracing::warn!(role = %raw, path = %request.target_path, "unrecognized role, failing closed");
                    Decision::RedirectToLogin { return_url: None }
                }
                None => {
                    tracing::warn!(path = %request.target_path, "token present but role unresolvable, failing closed");
                    Decision::RedirectToLogin { return_url: None }
                }
            },
        };

        tracing::debug!(
            path = %request.target_path,
            required = ?request.required_role,
            decision = ?decision,
            "navigation authorized"
        );
        decision
    }
}
