use super::DurableStorage;
use crate::errors::StorageError;
use keyring::Entry;

/// OSのキーチェーンを使うストア。キーごとに1エントリ。
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: &str) -> Self {
        KeyringStorage {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl DurableStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                tracing::debug!("No keyring entry for {} to delete", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("keyring service {}", self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_names_service() {
        let storage = KeyringStorage::new("chat-session-test");
        assert_eq!(storage.describe(), "keyring service chat-session-test");
    }

    #[test]
    fn test_keyring_roundtrip_when_available() {
        let storage = KeyringStorage::new("chat-session-test");

        // CI環境ではキーチェーンが使えないことがある
        match storage.set("token", "keyring-value") {
            Ok(()) => {
                assert_eq!(
                    storage.get("token").unwrap(),
                    Some("keyring-value".to_string())
                );
                storage.remove("token").unwrap();
                assert_eq!(storage.get("token").unwrap(), None);
                assert!(storage.remove("token").is_ok());
            }
            Err(e) => {
                println!("Skipping keyring roundtrip (keyring not available: {})", e);
            }
        }
    }
}
