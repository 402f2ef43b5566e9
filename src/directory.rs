use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{RegisterUserRequest, Role, RoleClaim, UpdateUserRequest, User};

/// Failures of directory writes that the API maps onto distinct statuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user not found")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
}

/// Credentials record: the public user plus its password.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password: String,
}

/// UserDirectory Trait
///
/// Persistence contract of the development auth API. Handlers only talk to this
/// trait, so the in-memory directory can be swapped for a real store.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserDirectory>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    // --- Lookup ---
    async fn find_by_email(&self, email: &str) -> Option<StoredUser>;
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn list_users(&self) -> Vec<User>;

    // --- Writes ---
    async fn create_user(&self, req: RegisterUserRequest) -> Result<User, DirectoryError>;
    // Partial update: only provided fields change.
    async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<User, DirectoryError>;
    async fn delete_user(&self, id: i64) -> bool;
    // Flips `enabled`. Returns false for an unknown id.
    async fn toggle_status(&self, id: i64) -> bool;
    async fn record_login(&self, id: i64);
}

/// DirectoryState
///
/// The shared handle the API state holds on its directory.
pub type DirectoryState = Arc<dyn UserDirectory>;

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, StoredUser>,
    next_id: i64,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users.values().any(|stored| {
            stored.user.email.eq_ignore_ascii_case(email) && Some(stored.user.id) != except
        })
    }
}

/// InMemoryDirectory
///
/// Mock-data directory backing the development API. Emails are matched
/// case-insensitively; passwords are kept as given, which is only acceptable
/// because this directory never leaves a developer machine or a test.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// One account per role, matching the credentials pre-filled by the login form.
    pub async fn seeded() -> Self {
        let directory = Self::new();
        let seeds = [
            ("System", "Admin", "admin@medinsight.com", "Admin123!", Role::Admin),
            ("Grace", "Hopper", "doctor@medinsight.com", "Doctor123!", Role::Doctor),
            ("Alan", "Turing", "patient@medinsight.com", "Patient123!", Role::Patient),
        ];
        for (first_name, last_name, email, password, role) in seeds {
            let request = RegisterUserRequest {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role,
                phone: None,
                address: None,
            };
            if let Err(e) = directory.create_user(request).await {
                tracing::warn!(email, error = %e, "seed user skipped");
            }
        }
        directory
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Option<StoredUser> {
        let inner = self.inner.read().await;
        inner
            .users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    async fn get_user(&self, id: i64) -> Option<User> {
        let inner = self.inner.read().await;
        inner.users.get(&id).map(|stored| stored.user.clone())
    }

    async fn list_users(&self) -> Vec<User> {
        let inner = self.inner.read().await;
        inner.users.values().map(|stored| stored.user.clone()).collect()
    }

    async fn create_user(&self, req: RegisterUserRequest) -> Result<User, DirectoryError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&req.email, None) {
            return Err(DirectoryError::DuplicateEmail);
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            role: Some(RoleClaim::Known(req.role)),
            phone: req.phone,
            address: req.address,
            enabled: true,
            created_at: Some(Utc::now()),
            last_login: None,
        };
        inner.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password: req.password,
            },
        );
        Ok(user)
    }

    async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<User, DirectoryError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = req.email.as_deref() {
            if inner.email_taken(email, Some(id)) {
                return Err(DirectoryError::DuplicateEmail);
            }
        }

        let stored = inner.users.get_mut(&id).ok_or(DirectoryError::NotFound)?;
        let user = &mut stored.user;
        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(role) = req.role {
            user.role = Some(RoleClaim::Known(role));
        }
        if req.phone.is_some() {
            user.phone = req.phone;
        }
        if req.address.is_some() {
            user.address = req.address;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }

    async fn toggle_status(&self, id: i64) -> bool {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(stored) => {
                stored.user.enabled = !stored.user.enabled;
                true
            }
            None => false,
        }
    }

    async fn record_login(&self, id: i64) {
        if let Some(stored) = self.inner.write().await.users.get_mut(&id) {
            stored.user.last_login = Some(Utc::now());
        }
    }
}
