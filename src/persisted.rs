use crate::cell::{ReactiveCell, Subscription};
use crate::errors::StorageError;
use crate::storage::DurableStorage;
use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;

/// A string cell mirrored to durable storage under one key.
///
/// The mirror is the cell's first subscriber, so storage is written before
/// any other subscriber sees a new value. Setting a non-empty string stores
/// it; setting `None` or `""` removes the key. Constructing the cell only
/// reads. Storage failures are logged and remembered but never stop the
/// in-memory update.
pub struct PersistedCell {
    cell: ReactiveCell<Option<String>>,
    key: String,
    storage: Rc<dyn DurableStorage>,
    last_error: Rc<RefCell<Option<String>>>,
    _mirror: Subscription,
}

impl PersistedCell {
    pub fn new(storage: Rc<dyn DurableStorage>, key: &str) -> Self {
        let (initial, read_error) = load_initial(storage.as_ref(), key);
        let cell = ReactiveCell::new(initial);
        let last_error = Rc::new(RefCell::new(read_error));

        let mirror = {
            let storage = Rc::clone(&storage);
            let last_error = Rc::clone(&last_error);
            let key = key.to_string();
            // The replay only echoes what was just read (or nothing, if the
            // read failed), so it must not touch storage.
            let replayed = Cell::new(false);
            cell.subscribe(move |value: &Option<String>| {
                if !replayed.replace(true) {
                    return;
                }
                let result = match value.as_deref().filter(|v| !v.is_empty()) {
                    Some(v) => storage.set(&key, v),
                    None => storage.remove(&key),
                };
                match result {
                    Ok(()) => {
                        last_error.borrow_mut().take();
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to mirror {} to {}: {}. Keeping in-memory value.",
                            key,
                            storage.describe(),
                            e
                        );
                        *last_error.borrow_mut() = Some(e.to_string());
                    }
                }
            })
        };

        PersistedCell {
            cell,
            key: key.to_string(),
            storage,
            last_error,
            _mirror: mirror,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage_location(&self) -> String {
        self.storage.describe()
    }

    /// When the stored value was last written, if the backend records it.
    pub fn updated_at(&self) -> Result<Option<String>, StorageError> {
        self.storage.updated_at(&self.key)
    }

    /// Message of the most recent failed storage access, cleared by the next
    /// successful write. A failed read at construction counts.
    pub fn last_storage_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }
}

impl Deref for PersistedCell {
    type Target = ReactiveCell<Option<String>>;

    fn deref(&self) -> &Self::Target {
        &self.cell
    }
}

fn load_initial(storage: &dyn DurableStorage, key: &str) -> (Option<String>, Option<String>) {
    match storage.get(key) {
        Ok(Some(value)) if !value.is_empty() => {
            tracing::debug!("Loaded {} from {}", key, storage.describe());
            (Some(value), None)
        }
        Ok(_) => {
            tracing::debug!("No stored {} in {}", key, storage.describe());
            (None, None)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to read {} from {}: {}. Starting empty.",
                key,
                storage.describe(),
                e
            );
            (None, Some(e.to_string()))
        }
    }
}
