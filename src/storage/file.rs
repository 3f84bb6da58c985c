use super::DurableStorage;
use crate::errors::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// JSONファイルに保存するキーバリューストア
///
/// The whole object is re-read before and rewritten after every change, so
/// two handles on the same file see each other's writes.
pub struct FileStorage {
    file_path: PathBuf,
}

impl FileStorage {
    pub fn new(file_path: PathBuf) -> Result<Self, StorageError> {
        // 親ディレクトリが存在しない場合は作成
        if let Some(parent) = file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let storage = FileStorage { file_path };
        // Reject an unreadable file up front rather than on first access.
        storage.read_entries()?;
        Ok(storage)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.file_path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.file_path, contents)?;
        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.file_path.display().to_string()
    }
}
