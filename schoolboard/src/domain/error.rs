//! Client error taxonomy.
//!
//! Every variant renders as one human-readable message through `Display`;
//! the presentation layer never needs to inspect which call produced it.
//! `CorruptSession` is recovered inside the session store and only ever
//! appears in logs.

use super::ports::{ApiClientError, KeyValueStorageError, define_port_error};

define_port_error! {
    /// Errors surfaced by the session store, login flow and dashboard loader.
    pub enum ClientError {
        /// Transport failure; no response was received.
        Network { message: String } => "network error: {message}",
        /// The server responded with a failure status.
        Http { status: u16, body: String } =>
            "request failed with status {status}: {body}",
        /// A response body did not match the expected shape.
        Protocol { message: String } => "unexpected response: {message}",
        /// The stored session could not be parsed.
        CorruptSession { message: String } => "stored session is corrupt: {message}",
        /// The auth endpoint rejected the credentials.
        Auth { message: String } => "login failed: {message}",
        /// The session storage medium failed.
        Storage { message: String } => "session storage failed: {message}",
        /// A request could not be constructed.
        InvalidRequest { message: String } => "invalid request: {message}",
    }
}

impl From<ApiClientError> for ClientError {
    fn from(value: ApiClientError) -> Self {
        match value {
            ApiClientError::Network { message } => Self::Network { message },
            ApiClientError::Http { status, body } => Self::Http { status, body },
            ApiClientError::InvalidRequest { message } => Self::InvalidRequest { message },
        }
    }
}

impl From<KeyValueStorageError> for ClientError {
    fn from(value: KeyValueStorageError) -> Self {
        match value {
            KeyValueStorageError::Backend { message } => Self::Storage { message },
        }
    }
}
