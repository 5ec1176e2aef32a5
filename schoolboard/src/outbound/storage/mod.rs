//! Durable session storage.

mod file_storage;

pub use file_storage::{FileKeyValueStorage, STORAGE_FILE_NAME};
