//! Durable key-value storage backends.
//!
//! Every backend exposes the same three operations as a browser's local
//! storage: read a string under a key, write one, and remove one. Values are
//! opaque strings; nothing here versions or encrypts them.

mod file;
mod keychain;
mod memory;
mod sqlite;

pub use file::FileStorage;
pub use keychain::KeyringStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::StorageError;
use std::rc::Rc;

/// A string key-value store that survives process restarts.
///
/// Removing a key that is not present is not an error.
pub trait DurableStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Human-readable location of the store, for status output.
    fn describe(&self) -> String;

    /// When `key` was last written, for backends that record it.
    fn updated_at(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}

/// Opens the backend named in the config.
///
/// A backend that cannot be opened is replaced by an in-memory store so the
/// session keeps working for the lifetime of the process.
pub fn open_storage(config: &StorageConfig) -> Rc<dyn DurableStorage> {
    match try_open_storage(config) {
        Ok(storage) => {
            tracing::debug!("Opened {} storage: {}", config.backend, storage.describe());
            storage
        }
        Err(e) => {
            tracing::warn!(
                "Failed to open {} storage ({}), falling back to in-memory storage. \
                 The token will not survive a restart.",
                config.backend,
                e
            );
            Rc::new(MemoryStorage::new())
        }
    }
}

pub fn try_open_storage(config: &StorageConfig) -> Result<Rc<dyn DurableStorage>, StorageError> {
    let storage: Rc<dyn DurableStorage> = match config.backend {
        StorageBackend::Sqlite => Rc::new(SqliteStorage::new(&required_path(config)?)?),
        StorageBackend::File => Rc::new(FileStorage::new(required_path(config)?)?),
        StorageBackend::Keyring => Rc::new(KeyringStorage::new(&config.keyring_service)),
        StorageBackend::Memory => Rc::new(MemoryStorage::new()),
    };
    Ok(storage)
}

fn required_path(config: &StorageConfig) -> Result<std::path::PathBuf, StorageError> {
    config
        .resolved_path()
        .ok_or_else(|| StorageError::Unavailable {
            reason: format!("{} backend has no storage path", config.backend),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_sqlite_storage() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: Some(dir.path().join("session.db")),
            ..Default::default()
        };

        let storage = try_open_storage(&config).unwrap();
        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap(), Some("abc".to_string()));
        assert!(storage.describe().contains("session.db"));
        assert!(storage.updated_at("token").unwrap().is_some());
    }

    #[test]
    fn test_open_file_storage() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: Some(dir.path().join("session.json")),
            ..Default::default()
        };

        let storage = try_open_storage(&config).unwrap();
        storage.set("token", "abc").unwrap();
        assert!(dir.path().join("session.json").exists());
        assert_eq!(storage.updated_at("token").unwrap(), None);
    }

    #[test]
    fn test_open_storage_falls_back_to_memory() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a sqlite database file.
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let storage = open_storage(&config);
        assert_eq!(storage.describe(), "memory");
        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn test_shared_storage_sees_writes() {
        let inner = Rc::new(MemoryStorage::new());
        let shared: Rc<dyn DurableStorage> = inner.clone();
        shared.set("k", "v").unwrap();
        assert_eq!(inner.get("k").unwrap(), Some("v".to_string()));
        inner.remove("k").unwrap();
        assert_eq!(shared.get("k").unwrap(), None);
    }
}
