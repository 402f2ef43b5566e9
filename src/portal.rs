use std::sync::Arc;

use crate::{
    authorizer::{Decision, RouteAuthorizer},
    config::AppConfig,
    error::{AuthError, StorageError},
    gateway::AuthGateway,
    navigation::Navigator,
    session::SessionStore,
    storage::{FileStorage, StorageState},
};

/// Portal
///
/// One application instance: the Session Store and every component that reads
/// it, wired around a single shared store.
#[derive(Clone)]
pub struct Portal {
    pub session: Arc<SessionStore>,
    pub gateway: Arc<AuthGateway>,
    pub navigator: Navigator,
}

impl Portal {
    /// Wires a portal over an already opened durable backend.
    pub fn new(storage: StorageState, api_base_url: &str) -> Self {
        let session = Arc::new(SessionStore::open(storage));
        let gateway = Arc::new(AuthGateway::new(api_base_url, session.clone()));
        let navigator = Navigator::new(RouteAuthorizer::new(session.clone()));
        Self {
            session,
            gateway,
            navigator,
        }
    }

    /// Opens the session file named by the configuration and wires the portal.
    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let storage = FileStorage::open(&config.session_file)?;
        Ok(Self::new(Arc::new(storage), &config.api_base_url))
    }

    /// sign_in
    ///
    /// Login followed by the post-login navigation: the return target when the
    /// new session may enter it, the role's dashboard otherwise.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        return_url: Option<&str>,
    ) -> Result<String, AuthError> {
        let response = self.gateway.login(email, password).await?;
        Ok(self
            .navigator
            .resume_target(return_url, Some(&response.role)))
    }

    pub fn navigate(&self, path: &str) -> Decision {
        self.navigator.navigate(path)
    }

    pub fn sign_out(&self) -> Decision {
        self.gateway.logout()
    }
}
