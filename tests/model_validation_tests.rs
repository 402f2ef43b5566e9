use med_portal::{
    AuthError, ErrorKind,
    models::{
        CurrentUserSnapshot, LoginResponse, RegisterUserRequest, Role, RoleClaim,
        UpdateUserRequest, User, is_plausible_email,
    },
};
use serde_json::json;

#[test]
fn test_role_wire_form_is_upper_case() {
    assert_eq!(serde_json::to_value(Role::Doctor).unwrap(), json!("DOCTOR"));
    assert_eq!(
        serde_json::from_value::<Role>(json!("PATIENT")).unwrap(),
        Role::Patient
    );
    assert!(serde_json::from_value::<Role>(json!("patient")).is_err());
}

#[test]
fn test_role_claim_keeps_unrecognized_values() {
    let claim: RoleClaim = serde_json::from_value(json!("NURSE")).unwrap();
    assert_eq!(claim, RoleClaim::Unrecognized("NURSE".to_string()));
    assert_eq!(claim.known(), None);
    assert_eq!(serde_json::to_value(&claim).unwrap(), json!("NURSE"));

    let known: RoleClaim = serde_json::from_value(json!("ADMIN")).unwrap();
    assert_eq!(known, Role::Admin);
}

#[test]
fn test_login_response_requires_every_field() {
    let missing_role = json!({
        "accessToken": "t", "refreshToken": null, "tokenType": "Bearer",
        "expiresIn": 3600, "email": "a@b.c", "firstName": "A", "lastName": "B"
    });
    assert!(serde_json::from_value::<LoginResponse>(missing_role).is_err());
}

#[test]
fn test_user_tolerates_partial_payload() {
    let user: User = serde_json::from_value(json!({
        "id": 4, "firstName": "A", "lastName": "B", "email": "a@b.c"
    }))
    .unwrap();

    assert_eq!(user.role, None);
    assert!(user.enabled);
    assert_eq!(user.created_at, None);
}

#[test]
fn test_current_user_snapshot_shape() {
    let snapshot = CurrentUserSnapshot {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "g@h.io".to_string(),
        role: Some(RoleClaim::Known(Role::Doctor)),
    };
    assert_eq!(
        serde_json::to_value(&snapshot).unwrap(),
        json!({ "firstName": "Grace", "lastName": "Hopper", "email": "g@h.io", "role": "DOCTOR" })
    );
}

#[test]
fn test_update_request_only_sends_provided_fields() {
    let changes = UpdateUserRequest {
        role: Some(Role::Doctor),
        ..Default::default()
    };
    assert_eq!(serde_json::to_value(&changes).unwrap(), json!({ "role": "DOCTOR" }));
}

#[test]
fn test_registration_validation_rules() {
    let valid = RegisterUserRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@medinsight.com".to_string(),
        password: "Engine".to_string(),
        role: Role::Patient,
        phone: None,
        address: None,
    };
    assert!(valid.validate().is_ok());

    let short_password = RegisterUserRequest {
        password: "12345".to_string(),
        ..valid.clone()
    };
    assert!(short_password.validate().unwrap_err().contains("Password"));

    let bad_email = RegisterUserRequest {
        email: "ada.medinsight.com".to_string(),
        ..valid
    };
    assert!(bad_email.validate().is_err());
}

#[test]
fn test_email_plausibility() {
    assert!(is_plausible_email("a@b"));
    assert!(!is_plausible_email("@b.c"));
    assert!(!is_plausible_email("a@"));
    assert!(!is_plausible_email("a b@c.d"));
    assert!(!is_plausible_email("a@b@c"));
}

#[test]
fn test_error_taxonomy_and_messages() {
    assert_eq!(AuthError::ServerUnreachable.kind(), ErrorKind::NetworkUnreachable);
    assert_eq!(AuthError::DuplicateEmail.kind(), ErrorKind::Rejected);
    assert_eq!(AuthError::Malformed("x".into()).kind(), ErrorKind::Malformed);
    assert_eq!(AuthError::Unknown("x".into()).kind(), ErrorKind::Unknown);

    assert_eq!(
        AuthError::InvalidCredentials(Some("Account is disabled".into())).user_message(),
        "Account is disabled"
    );
    assert_eq!(
        AuthError::InvalidCredentials(Some("nope".into())).to_string(),
        "invalid credentials: nope"
    );
    assert_eq!(
        AuthError::InvalidCredentials(None).to_string(),
        "invalid credentials"
    );
}

#[test]
fn test_home_routes() {
    assert_eq!(Role::Admin.home_route(), "/admin/dashboard");
    assert_eq!(Role::Doctor.home_route(), "/doctor/dashboard");
    assert_eq!(Role::Patient.home_route(), "/patient/dashboard");
}
