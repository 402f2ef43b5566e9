use crate::{
    authorizer::{Decision, RouteAuthorizer, RouteRequest},
    models::{Role, RoleClaim},
};

/// Access requirement of one portal route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable without a session (login, registration).
    Public,
    RequiresRole(Role),
    /// Not a view: navigating here lands on the login page.
    LoginRedirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    /// Path without the leading slash, as declared in the route table.
    pub path: &'static str,
    pub access: Access,
}

/// The portal's route table. Unknown paths fall through to the login page.
pub const ROUTES: &[RouteEntry] = &[
    RouteEntry { path: "", access: Access::LoginRedirect },
    RouteEntry { path: "auth/login", access: Access::Public },
    RouteEntry { path: "auth/register", access: Access::Public },
    RouteEntry { path: "admin/dashboard", access: Access::RequiresRole(Role::Admin) },
    RouteEntry { path: "admin/users", access: Access::RequiresRole(Role::Admin) },
    RouteEntry { path: "admin/system", access: Access::RequiresRole(Role::Admin) },
    RouteEntry { path: "doctor/dashboard", access: Access::RequiresRole(Role::Doctor) },
    RouteEntry { path: "patient/dashboard", access: Access::RequiresRole(Role::Patient) },
    RouteEntry { path: "patient/appointments", access: Access::RequiresRole(Role::Patient) },
    RouteEntry { path: "patient/recommendations", access: Access::RequiresRole(Role::Patient) },
    RouteEntry { path: "patient/medical-info", access: Access::RequiresRole(Role::Patient) },
];

const FALLBACK: Access = Access::LoginRedirect;

/// Strips the query string, fragment and surrounding slashes.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].trim_matches('/')
}

fn lookup(path: &str) -> Option<&'static RouteEntry> {
    let wanted = normalize(path);
    ROUTES.iter().find(|entry| entry.path == wanted)
}

/// Access requirement of `path`; unknown paths resolve to the login redirect.
pub fn resolve(path: &str) -> Access {
    lookup(path).map(|entry| entry.access).unwrap_or(FALLBACK)
}

/// A return target must be a path on this origin: exactly one leading slash
/// and no backslash, so browsers cannot read it as another host.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

/// Navigator
///
/// The navigation layer: resolves a path against the route table and asks the
/// Route Authorizer about every guarded view.
#[derive(Clone)]
pub struct Navigator {
    authorizer: RouteAuthorizer,
}

impl Navigator {
    pub fn new(authorizer: RouteAuthorizer) -> Self {
        Self { authorizer }
    }

    pub fn authorizer(&self) -> &RouteAuthorizer {
        &self.authorizer
    }

    /// navigate
    ///
    /// Returns the decision for one navigation attempt. Redirect-only routes
    /// (the empty path, unknown paths) answer with a login redirect that carries
    /// no return target.
    pub fn navigate(&self, path: &str) -> Decision {
        match resolve(path) {
            Access::Public => Decision::Admit,
            Access::LoginRedirect => Decision::RedirectToLogin { return_url: None },
            Access::RequiresRole(role) => {
                self.authorizer.authorize(&RouteRequest::new(Some(role), path))
            }
        }
    }

    /// resume_target
    ///
    /// Where to go right after a successful login: the return target when the
    /// new session may enter it, otherwise the dashboard of the session's role,
    /// or `/` when that role is not one the portal knows.
    pub fn resume_target(&self, return_url: Option<&str>, role: Option<&RoleClaim>) -> String {
        if let Some(url) = return_url.filter(|url| is_local_path(url)) {
            if let Some(entry) = lookup(url) {
                let guarded = matches!(entry.access, Access::RequiresRole(_));
                if guarded && self.navigate(url).is_admitted() {
                    return format!("/{}", entry.path);
                }
            }
        }

        match role.and_then(RoleClaim::known) {
            Some(role) => role.home_route().to_string(),
            None => "/".to_string(),
        }
    }
}
