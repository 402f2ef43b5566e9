use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;

// Durable keys written by the Session Store. Nothing outside `session` reads them.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_ROLE_KEY: &str = "user_role";
pub const USER_EMAIL_KEY: &str = "user_email";
pub const CURRENT_USER_KEY: &str = "current_user";

pub const SESSION_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    USER_ROLE_KEY,
    USER_EMAIL_KEY,
    CURRENT_USER_KEY,
];

// 1. LocalStorage Contract
/// LocalStorage
///
/// A string key/value namespace that survives a process restart, the native
/// counterpart of browser local storage. Operations are synchronous: a value
/// written by `set_item` is returned by the next `get_item` on any thread.
///
/// The file-backed implementation (`FileStorage`) is used by the application;
/// `MemoryStorage` stands in for it in tests.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The shared handle the Session Store holds on its durable backend.
pub type StorageState = Arc<dyn LocalStorage>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// 2. The Real Implementation (JSON document on disk)
/// FileStorage
///
/// Keeps the whole namespace as one JSON object in a single file. Every
/// mutation rewrites the document through a temporary sibling followed by a
/// rename, so a crash mid-write leaves the previous document intact.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// open
    ///
    /// Loads the namespace stored at `path`. A missing or empty file is an
    /// empty namespace. A file that is not a JSON object is logged and also
    /// treated as empty; the next write replaces it. Only I/O failures reach
    /// the caller.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "durable storage is corrupt, starting with an empty namespace"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "durable storage opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let document = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, document)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

// 3. The Mock Implementation (For Tests)
/// MemoryStorage
///
/// In-memory namespace used by tests. Cloning shares the underlying map, which
/// lets a test "reload" by building a fresh Session Store over the same data.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    /// When true, every write returns a simulated failure.
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn simulated_failure() -> StorageError {
        StorageError::Io(io::Error::other("Mock Storage Error: Simulation requested"))
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(Self::simulated_failure());
        }
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(Self::simulated_failure());
        }
        lock(&self.entries).remove(key);
        Ok(())
    }
}
