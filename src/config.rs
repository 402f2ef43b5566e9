use std::env;
use std::path::PathBuf;

/// AppConfig
///
/// Holds the portal's entire configuration. Immutable once loaded and pulled into
/// the development API's state via FromRef, the same way the client side is
/// handed its API root and session file.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls defaults and fail-fast checks.
    pub env: Env,
    // Root of the auth API consumed by the Auth Gateway (no trailing slash needed).
    pub api_base_url: String,
    // File backing the durable session storage.
    pub session_file: PathBuf,
    // Address the development auth API binds to.
    pub bind_addr: String,
    // Secret used to sign and validate access tokens (HS256).
    pub jwt_secret: String,
    // Lifetime of issued access tokens, in seconds.
    pub token_ttl_secs: i64,
}

/// Env
///
/// Runtime context: local development with seeded defaults, or production where
/// every secret must be provided explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const LOCAL_JWT_SECRET: &str = "med-portal-local-development-secret";

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test setup; no environment variables read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: "http://127.0.0.1:8080".to_string(),
            session_file: PathBuf::from("med-portal-session.json"),
            bind_addr: "127.0.0.1:8080".to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (after `.env` has been
    /// applied by the caller).
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` or `PORTAL_API_URL` is missing, so the
    /// portal never starts with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let session_file = env::var("PORTAL_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("med-portal-session.json"));

        match env {
            Env::Local => {
                let bind_addr =
                    env::var("PORTAL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
                Self {
                    env: Env::Local,
                    // Local clients talk to the development API by default.
                    api_base_url: env::var("PORTAL_API_URL")
                        .unwrap_or_else(|_| format!("http://{bind_addr}")),
                    session_file,
                    bind_addr,
                    jwt_secret: env::var("JWT_SECRET")
                        .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                    token_ttl_secs,
                }
            }
            Env::Production => Self {
                env: Env::Production,
                api_base_url: env::var("PORTAL_API_URL")
                    .expect("FATAL: PORTAL_API_URL must be set in production."),
                session_file,
                bind_addr: env::var("PORTAL_BIND_ADDR")
                    .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                token_ttl_secs,
            },
        }
    }
}
