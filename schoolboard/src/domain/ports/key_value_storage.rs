//! Driven port for the persisted key-value medium behind the session store.
//!
//! In a browser this is local storage; the CLI uses a file. The domain only
//! needs synchronous get/set/delete of string values.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value storage adapters.
    pub enum KeyValueStorageError {
        /// The backing medium could not be read or written.
        Backend { message: String } => "key-value storage failed: {message}",
    }
}

/// Port for the persisted key-value capability.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    /// Return the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStorageError>;

    /// Insert or replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), KeyValueStorageError>;
}

/// In-memory storage used by tests and embedders without persistence.
///
/// # Examples
/// ```
/// use schoolboard::domain::ports::{InMemoryKeyValueStorage, KeyValueStorage};
///
/// let storage = InMemoryKeyValueStorage::default();
/// storage.set("accessToken", "tok1")?;
/// assert_eq!(storage.get("accessToken")?.as_deref(), Some("tok1"));
/// storage.delete("accessToken")?;
/// assert!(storage.get("accessToken")?.is_none());
/// # Ok::<(), schoolboard::domain::ports::KeyValueStorageError>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryKeyValueStorage {
    /// Seed the storage with existing entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of every stored entry, ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeyValueStorage for InMemoryKeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStorageError> {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStorageError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyValueStorageError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }
}
