//! JSON-file key-value storage for the command-line client.
//!
//! All keys live in one JSON object inside the state directory. Every
//! mutation rewrites the file through a staged sibling and a rename, so a
//! crashed write never leaves a half-written map behind. On Unix the file is
//! created owner-only, since it carries a bearer token.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[cfg(unix)]
use cap_std::fs::OpenOptionsExt;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::warn;

use crate::domain::ports::{KeyValueStorage, KeyValueStorageError};

/// File holding the key-value map inside the state directory.
pub const STORAGE_FILE_NAME: &str = "session.json";

const STAGING_FILE_NAME: &str = ".session.json.tmp";

/// Owner read/write only.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Key-value storage persisted as a JSON object on disk.
pub struct FileKeyValueStorage {
    dir: Dir,
    path: PathBuf,
    lock: Mutex<()>,
}

impl std::fmt::Debug for FileKeyValueStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyValueStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileKeyValueStorage {
    /// Open (creating if needed) the state directory at `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStorageError::Backend`] when the directory cannot be
    /// created or opened.
    pub fn open(state_dir: &Path) -> Result<Self, KeyValueStorageError> {
        Dir::create_ambient_dir_all(state_dir, ambient_authority())
            .map_err(|err| io_error(state_dir, &err))?;
        let dir = Dir::open_ambient_dir(state_dir, ambient_authority())
            .map_err(|err| io_error(state_dir, &err))?;
        Ok(Self {
            dir,
            path: state_dir.join(STORAGE_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, KeyValueStorageError> {
        let raw = match self.dir.read_to_string(STORAGE_FILE_NAME) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "session file is not a JSON string map; treating it as empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), KeyValueStorageError> {
        let encoded = serde_json::to_vec_pretty(entries).map_err(|err| {
            KeyValueStorageError::backend(format!("failed to encode session file: {err}"))
        })?;
        self.write_staging(&encoded)?;
        self.dir
            .rename(STAGING_FILE_NAME, &self.dir, STORAGE_FILE_NAME)
            .map_err(|err| io_error(&self.path, &err))
    }

    fn write_staging(&self, contents: &[u8]) -> Result<(), KeyValueStorageError> {
        // A leftover staging file would keep its old mode; start fresh.
        drop(self.dir.remove_file(STAGING_FILE_NAME));

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);
        let mut file = self
            .dir
            .open_with(STAGING_FILE_NAME, &options)
            .map_err(|err| io_error(&self.path, &err))?;

        let written = file.write_all(contents);
        if let Err(err) = written.and_then(|()| file.sync_all()) {
            drop(file);
            drop(self.dir.remove_file(STAGING_FILE_NAME));
            return Err(io_error(&self.path, &err));
        }
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), KeyValueStorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if apply(&mut entries) {
            self.store(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn delete(&self, key: &str) -> Result<(), KeyValueStorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

fn io_error(path: &Path, error: &io::Error) -> KeyValueStorageError {
    KeyValueStorageError::backend(format!("{}: {error}", path.display()))
}
