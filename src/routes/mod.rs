/// Router Module Index
///
/// The development auth API's routes, split by who may call them. Access control
/// is enforced by the `ApiUser` extractor on every non-public handler, plus an
/// explicit ADMIN check inside the admin handlers.

/// Routes accessible without a token (health, login, registration).
pub mod public;

/// Routes requiring a valid bearer token.
pub mod authenticated;

/// Routes restricted to the ADMIN role (user management).
pub mod admin;
