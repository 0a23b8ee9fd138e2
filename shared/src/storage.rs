//! Durable client-side key/value storage.
//!
//! In the browser this is `window.localStorage`; [`MemoryStore`] backs tests
//! and browsers where localStorage is disabled.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

/// Failure reported by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backing store could not be reached at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Reading a key failed.
    #[error("failed to read `{key}`: {message}")]
    Read {
        /// Key being read.
        key: String,
        /// Backend specific description.
        message: String,
    },
    /// Writing a key failed, typically because the quota is exhausted.
    #[error("failed to write `{key}`: {message}")]
    Write {
        /// Key being written.
        key: String,
        /// Backend specific description.
        message: String,
    },
}

/// String key/value store with localStorage semantics.
///
/// Methods take `&self`: the browser store is shared and mutated through a
/// handle, so implementations use interior mutability.
pub trait KeyValueStore {
    /// Value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Every key currently stored.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip_and_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        store.remove("missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn shared_handle_sees_same_entries() {
        let store = Rc::new(MemoryStore::new());
        let handle = Rc::clone(&store);
        handle.set("k", "v").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
    }
}
