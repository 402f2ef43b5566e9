use med_portal::{
    AppConfig, Portal, StorageError,
    authorizer::Decision,
    models::{Role, RoleClaim, Session},
    session::SessionStore,
    storage::{ACCESS_TOKEN_KEY, FileStorage, LocalStorage, MemoryStorage},
};
use std::sync::Arc;
use tempfile::tempdir;

#[cfg(test)]
mod file_tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_namespace() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();
        assert_eq!(storage.get_item(ACCESS_TOKEN_KEY), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("access_token", "abc").unwrap();
        storage.set_item("user_role", "PATIENT").unwrap();
        storage.remove_item("user_role").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("access_token").as_deref(), Some("abc"));
        assert_eq!(reopened.get_item("user_role"), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_removing_absent_key_is_not_an_error() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();
        assert!(storage.remove_item("never-set").is_ok());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty_and_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "this is not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get_item(ACCESS_TOKEN_KEY), None);

        storage.set_item(ACCESS_TOKEN_KEY, "fresh").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    }

    #[test]
    fn test_portal_starts_over_corrupt_session_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"access_token\": ").unwrap();
        let config = AppConfig {
            session_file: path,
            ..AppConfig::default()
        };

        let portal = Portal::from_config(&config).unwrap();

        assert_eq!(portal.session.get(), None);
        assert_eq!(
            portal.navigate("/admin/dashboard").location().as_deref(),
            Some("/auth/login?returnUrl=%2Fadmin%2Fdashboard")
        );
    }

    #[test]
    fn test_portal_from_config_restores_saved_session() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            session_file: dir.path().join("portal").join("session.json"),
            ..AppConfig::default()
        };

        let first = Portal::from_config(&config).unwrap();
        first.session.set(Session {
            token: Some("tok".to_string()),
            role: Some(RoleClaim::Known(Role::Doctor)),
            identity: None,
        });
        drop(first);

        let second = Portal::from_config(&config).unwrap();
        assert_eq!(second.session.token().as_deref(), Some("tok"));
        assert_eq!(second.navigate("/doctor/dashboard"), Decision::Admit);
        assert_eq!(
            second.navigate("/admin/dashboard").location().as_deref(),
            Some("/doctor/dashboard")
        );
    }

    #[test]
    fn test_session_round_trip_across_processes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let first = SessionStore::open(Arc::new(FileStorage::open(&path).unwrap()));
        first.set(Session {
            token: Some("tok".to_string()),
            role: Some(RoleClaim::Known(Role::Admin)),
            identity: None,
        });
        drop(first);

        let second = SessionStore::new(Arc::new(FileStorage::open(&path).unwrap()));
        assert_eq!(second.role_of(), Some(RoleClaim::Known(Role::Admin)));
        assert_eq!(second.token().as_deref(), Some("tok"));
    }
}

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let view = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(view.get_item("k").as_deref(), Some("v"));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_failing_storage_rejects_writes() {
        let storage = MemoryStorage::new_failing();
        assert!(matches!(storage.set_item("k", "v"), Err(StorageError::Io(_))));
        assert!(storage.remove_item("k").is_err());
        assert!(storage.is_empty());
    }
}
