use med_portal::{
    authorizer::{AccessState, Decision, RouteAuthorizer, RouteRequest},
    models::{Identity, Role, RoleClaim, Session},
    navigation::{self, Access, Navigator},
    session::SessionStore,
    storage::{ACCESS_TOKEN_KEY, LocalStorage, MemoryStorage, USER_ROLE_KEY},
};
use std::sync::Arc;

// --- Helpers ---

fn empty_store() -> (Arc<SessionStore>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let store = Arc::new(SessionStore::open(Arc::new(storage.clone())));
    (store, storage)
}

fn signed_in(role: Option<RoleClaim>) -> Arc<SessionStore> {
    let (store, _) = empty_store();
    store.set(Session {
        token: Some("token".to_string()),
        role,
        identity: Some(Identity {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@medinsight.com".to_string(),
        }),
    });
    store
}

fn request(role: Role) -> RouteRequest {
    RouteRequest::new(Some(role), role.home_route())
}

// --- Authorizer ---

#[test]
fn test_no_token_redirects_to_login_despite_stale_durable_role() {
    let (store, storage) = empty_store();
    storage.set_item(USER_ROLE_KEY, "ADMIN").unwrap();
    let authorizer = RouteAuthorizer::new(store);

    for role in Role::ALL {
        let decision = authorizer.authorize(&request(role));
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                return_url: Some(role.home_route().to_string())
            }
        );
        assert_eq!(authorizer.classify(Some(role)), AccessState::Unauthenticated);
    }
}

#[test]
fn test_anonymous_patient_route_carries_return_url() {
    let (store, _) = empty_store();
    let authorizer = RouteAuthorizer::new(store);

    let decision = authorizer.authorize(&RouteRequest::new(
        Some(Role::Patient),
        "/patient/dashboard",
    ));

    assert_eq!(
        decision.location().as_deref(),
        Some("/auth/login?returnUrl=%2Fpatient%2Fdashboard")
    );
}

#[test]
fn test_wrong_role_redirects_to_actual_role_home() {
    for actual in Role::ALL {
        let authorizer = RouteAuthorizer::new(signed_in(Some(actual.into())));
        for required in Role::ALL.into_iter().filter(|r| *r != actual) {
            let decision = authorizer.authorize(&request(required));
            assert_eq!(decision, Decision::RedirectToHome(actual));
            assert_eq!(decision.location().as_deref(), Some(actual.home_route()));
            assert_ne!(decision.location().as_deref(), Some(required.home_route()));
            assert_eq!(
                authorizer.classify(Some(required)),
                AccessState::AuthorizedWrongRole
            );
        }
    }
}

#[test]
fn test_matching_role_is_admitted() {
    for role in Role::ALL {
        let authorizer = RouteAuthorizer::new(signed_in(Some(role.into())));
        assert_eq!(authorizer.authorize(&request(role)), Decision::Admit);
        assert_eq!(
            authorizer.classify(Some(role)),
            AccessState::AuthorizedSameRole
        );
    }
}

#[test]
fn test_route_without_required_role_admits_any_signed_in_caller() {
    let authorizer = RouteAuthorizer::new(signed_in(Some(Role::Patient.into())));
    let decision = authorizer.authorize(&RouteRequest::new(None, "/profile"));
    assert!(decision.is_admitted());
    assert_eq!(decision.location(), None);
}

#[test]
fn test_token_without_role_fails_closed() {
    let authorizer = RouteAuthorizer::new(signed_in(None));

    let decision = authorizer.authorize(&request(Role::Doctor));

    assert_eq!(decision, Decision::RedirectToLogin { return_url: None });
    assert_eq!(decision.location().as_deref(), Some("/auth/login"));
}

#[test]
fn test_unrecognized_role_fails_closed_to_login() {
    let authorizer =
        RouteAuthorizer::new(signed_in(Some(RoleClaim::Unrecognized("NURSE".into()))));

    let decision = authorizer.authorize(&request(Role::Admin));

    assert_eq!(decision, Decision::RedirectToLogin { return_url: None });
}

#[test]
fn test_decision_follows_role_change_within_session() {
    let store = signed_in(Some(Role::Doctor.into()));
    let authorizer = RouteAuthorizer::new(store.clone());
    assert_eq!(
        authorizer.authorize(&request(Role::Admin)),
        Decision::RedirectToHome(Role::Doctor)
    );

    let mut session = store.get().unwrap();
    session.role = Some(Role::Admin.into());
    store.set(session);

    assert_eq!(authorizer.authorize(&request(Role::Admin)), Decision::Admit);
}

#[test]
fn test_durable_only_session_is_authorized_before_rehydration() {
    let storage = MemoryStorage::new();
    storage.set_item(ACCESS_TOKEN_KEY, "token").unwrap();
    storage.set_item(USER_ROLE_KEY, "DOCTOR").unwrap();
    let store = Arc::new(SessionStore::new(Arc::new(storage)));

    let authorizer = RouteAuthorizer::new(store);

    assert_eq!(authorizer.authorize(&request(Role::Doctor)), Decision::Admit);
}

// --- Navigation table ---

#[test]
fn test_route_table_resolution() {
    assert_eq!(navigation::resolve(""), Access::LoginRedirect);
    assert_eq!(navigation::resolve("/"), Access::LoginRedirect);
    assert_eq!(navigation::resolve("/auth/login"), Access::Public);
    assert_eq!(navigation::resolve("/auth/register?step=2"), Access::Public);
    assert_eq!(
        navigation::resolve("/admin/users/"),
        Access::RequiresRole(Role::Admin)
    );
    assert_eq!(
        navigation::resolve("/patient/medical-info#allergies"),
        Access::RequiresRole(Role::Patient)
    );
    assert_eq!(navigation::resolve("/nowhere"), Access::LoginRedirect);
}

#[test]
fn test_doctor_navigating_to_admin_lands_on_doctor_dashboard() {
    let navigator = Navigator::new(RouteAuthorizer::new(signed_in(Some(Role::Doctor.into()))));

    let decision = navigator.navigate("/admin/dashboard");

    assert_eq!(decision.location().as_deref(), Some("/doctor/dashboard"));
}

#[test]
fn test_public_and_unknown_routes() {
    let (store, _) = empty_store();
    let navigator = Navigator::new(RouteAuthorizer::new(store));

    assert_eq!(navigator.navigate("/auth/register"), Decision::Admit);
    assert_eq!(
        navigator.navigate("/does/not/exist").location().as_deref(),
        Some("/auth/login")
    );
}

#[test]
fn test_resume_target_prefers_admitted_return_url() {
    let navigator = Navigator::new(RouteAuthorizer::new(signed_in(Some(Role::Patient.into()))));
    let role = RoleClaim::Known(Role::Patient);

    assert_eq!(
        navigator.resume_target(Some("/patient/appointments"), Some(&role)),
        "/patient/appointments"
    );
    assert_eq!(
        navigator.resume_target(Some("/admin/dashboard"), Some(&role)),
        "/patient/dashboard"
    );
    assert_eq!(
        navigator.resume_target(Some("/auth/login"), Some(&role)),
        "/patient/dashboard"
    );
    assert_eq!(navigator.resume_target(None, Some(&role)), "/patient/dashboard");
}

#[test]
fn test_resume_target_for_unrecognized_role_is_root() {
    let claim = RoleClaim::Unrecognized("NURSE".into());
    let navigator = Navigator::new(RouteAuthorizer::new(signed_in(Some(claim.clone()))));

    assert_eq!(navigator.resume_target(None, Some(&claim)), "/");
}

#[test]
fn test_resume_target_rejects_foreign_hosts() {
    let navigator = Navigator::new(RouteAuthorizer::new(signed_in(Some(Role::Admin.into()))));
    let role = RoleClaim::Known(Role::Admin);

    for url in [
        "//admin/dashboard",
        "//evil.example/admin/dashboard",
        "/\\evil.example/admin/dashboard",
        "\\admin/dashboard",
        "https://evil.example/admin/dashboard",
        "admin/dashboard",
    ] {
        assert_eq!(
            navigator.resume_target(Some(url), Some(&role)),
            "/admin/dashboard",
            "return url {url:?} should fall back to the role home"
        );
    }
}

#[test]
fn test_resume_target_returns_route_path_not_raw_input() {
    let navigator = Navigator::new(RouteAuthorizer::new(signed_in(Some(Role::Patient.into()))));
    let role = RoleClaim::Known(Role::Patient);

    assert_eq!(
        navigator.resume_target(Some("/patient/appointments/?tab=next#today"), Some(&role)),
        "/patient/appointments"
    );
}
