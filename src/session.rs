use tokio::sync::watch;

use crate::{
    models::{CurrentUserSnapshot, Identity, RoleClaim, Session, User},
    storage::{
        ACCESS_TOKEN_KEY, CURRENT_USER_KEY, SESSION_KEYS, StorageState, USER_EMAIL_KEY,
        USER_ROLE_KEY,
    },
};

/// SessionStore
///
/// Single owner of the authenticated identity for the lifetime of the process.
/// One store is constructed per application instance and shared by `Arc` with the
/// Auth Gateway, the Route Authorizer and any UI that wants to observe it.
///
/// The in-memory snapshot lives in a `watch` channel: a mutation is visible to
/// every synchronous reader as soon as `set`/`clear` returns, and every
/// subscriber is woken with the new value (push-based, no polling).
///
/// Durable storage is written on every mutation and read back through the
/// fallback tiers of `role_of` and `token`, so a freshly constructed store
/// answers correctly even before `rehydrate` has run.
pub struct SessionStore {
    storage: StorageState,
    current: watch::Sender<Option<Session>>,
}

impl SessionStore {
    /// Builds a store with an empty in-memory snapshot. Durable data is still
    /// reachable through the fallback tiers.
    pub fn new(storage: StorageState) -> Self {
        let (current, _) = watch::channel(None);
        Self { storage, current }
    }

    /// Builds a store and immediately rehydrates it from durable storage.
    pub fn open(storage: StorageState) -> Self {
        let store = Self::new(storage);
        store.rehydrate();
        store
    }

    /// rehydrate
    ///
    /// Loads the persisted session into memory. Malformed persisted data is
    /// logged and treated as absent. A session committed in the meantime is
    /// never overwritten by older durable data.
    pub fn rehydrate(&self) {
        let Some(session) = self.load_durable() else {
            return;
        };

        let loaded = self.current.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(session);
            true
        });

        if loaded {
            tracing::debug!("session rehydrated from durable storage");
        }
    }

    // --- Reads ---

    /// Current in-memory snapshot.
    pub fn get(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    /// Receiver woken on every mutation with the new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }

    /// token
    ///
    /// The bearer token of the loaded session, or the durable `access_token`
    /// when nothing is loaded yet. Empty strings are treated as absent.
    pub fn token(&self) -> Option<String> {
        if let Some(session) = self.current.borrow().as_ref() {
            return session.bearer().map(str::to_string);
        }
        self.storage
            .get_item(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// role_of
    ///
    /// Resolution order: the in-memory role, then the role inside the durable
    /// `current_user` snapshot, then the legacy durable `user_role` key.
    pub fn role_of(&self) -> Option<RoleClaim> {
        let in_memory = self
            .current
            .borrow()
            .as_ref()
            .and_then(|session| session.role.clone());

        in_memory
            .or_else(|| self.durable_snapshot().and_then(|snapshot| snapshot.role))
            .or_else(|| self.durable_role())
    }

    // --- Mutations ---

    /// set
    ///
    /// Replaces every field of the session, persists it and notifies subscribers.
    /// Durable write failures are logged; the in-memory session is still committed.
    pub fn set(&self, session: Session) {
        self.persist(&session);
        self.current.send_replace(Some(session));
    }

    /// clear
    ///
    /// Removes the session from memory and durable storage. Safe to call repeatedly.
    pub fn clear(&self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.storage.remove_item(key) {
                tracing::error!(key, error = %e, "failed to remove durable session key");
            }
        }
        self.current.send_replace(None);
    }

    /// merge_profile
    ///
    /// Folds an authoritative profile into the existing session. Identity is
    /// replaced; the role is only replaced when the payload carries one, so a
    /// partial profile never erases a known role.
    ///
    /// Without a token there is no session to merge into: the profile is
    /// ignored and nothing is written, so a cleared store stays cleared.
    pub fn merge_profile(&self, user: &User) -> Option<Session> {
        let base = self
            .get()
            .or_else(|| self.load_durable())
            .unwrap_or_default();

        let Some(token) = base.bearer().map(str::to_string).or_else(|| self.token()) else {
            tracing::warn!(email = %user.email, "profile arrived without a session, ignoring it");
            return None;
        };

        let role = user.role.clone().or_else(|| self.role_of());
        if user.role.is_none() && role.is_some() {
            tracing::debug!("profile payload without role, keeping the known role");
        }

        let merged = Session {
            token: Some(token),
            role,
            identity: Some(user.identity()),
        };
        self.set(merged.clone());
        Some(merged)
    }

    // --- Durable helpers ---

    fn persist(&self, session: &Session) {
        let write = |key: &str, value: Option<String>| {
            let result = match value {
                Some(value) => self.storage.set_item(key, &value),
                None => self.storage.remove_item(key),
            };
            if let Err(e) = result {
                tracing::error!(key, error = %e, "failed to persist session key");
            }
        };

        write(ACCESS_TOKEN_KEY, session.bearer().map(str::to_string));
        write(
            USER_ROLE_KEY,
            session.role.as_ref().map(|role| role.as_str().to_string()),
        );
        write(
            USER_EMAIL_KEY,
            session.identity.as_ref().map(|identity| identity.email.clone()),
        );

        let snapshot = match (&session.identity, &session.role) {
            (None, None) => None,
            (identity, role) => {
                let identity = identity.clone().unwrap_or_else(|| Identity {
                    first_name: String::new(),
                    last_name: String::new(),
                    email: String::new(),
                });
                let snapshot = CurrentUserSnapshot {
                    first_name: identity.first_name,
                    last_name: identity.last_name,
                    email: identity.email,
                    role: role.clone(),
                };
                match serde_json::to_string(&snapshot) {
                    Ok(json) => Some(json),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize current_user snapshot");
                        None
                    }
                }
            }
        };
        write(CURRENT_USER_KEY, snapshot);
    }

    fn durable_snapshot(&self) -> Option<CurrentUserSnapshot> {
        let raw = self.storage.get_item(CURRENT_USER_KEY)?;
        match serde_json::from_str::<CurrentUserSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed current_user in durable storage");
                None
            }
        }
    }

    fn durable_role(&self) -> Option<RoleClaim> {
        self.storage
            .get_item(USER_ROLE_KEY)
            .filter(|role| !role.is_empty())
            .map(RoleClaim::from)
    }

    fn load_durable(&self) -> Option<Session> {
        let token = self
            .storage
            .get_item(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty());
        let snapshot = self.durable_snapshot();

        let role = snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.role.clone())
            .or_else(|| self.durable_role());
        let identity = snapshot.map(|snapshot| Identity {
            first_name: snapshot.first_name,
            last_name: snapshot.last_name,
            email: snapshot.email,
        });

        if token.is_none() && role.is_none() && identity.is_none() {
            return None;
        }

        Some(Session {
            token,
            role,
            identity,
        })
    }
}
