//! Session store over the injected key-value capability.
//!
//! Layout: the raw token lives under [`ACCESS_TOKEN_KEY`] and the JSON user
//! record under [`USER_KEY`]. Writes go token first, then user, so a present
//! user key marks a complete session.

use std::sync::Arc;

use tracing::warn;

use super::ports::KeyValueStorage;
use super::{AccessToken, ClientError, Session, UserRecord};

/// Storage key holding the raw bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key holding the serialised [`UserRecord`].
pub const USER_KEY: &str = "user";

/// Reads and writes [`Session`] values as a unit.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: Arc<S>,
}

impl<S> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S> SessionStore<S>
where
    S: KeyValueStorage,
{
    /// Create a store backed by `storage`.
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Persist `session`.
    ///
    /// If the user record cannot be written the token is removed again so no
    /// reader is left with a token and no user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the medium rejects a write.
    pub fn write(&self, session: &Session) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(session.user())
            .map_err(|err| ClientError::storage(format!("failed to encode user record: {err}")))?;

        self.storage
            .set(ACCESS_TOKEN_KEY, session.access_token().expose())?;
        if let Err(err) = self.storage.set(USER_KEY, &user_json) {
            if let Err(rollback) = self.storage.delete(ACCESS_TOKEN_KEY) {
                warn!(error = %rollback, "failed to roll back access token after user write failure");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Load the stored session.
    ///
    /// Returns `Ok(None)` when either key is missing or the token is blank.
    /// A user record that does not parse is treated as corruption: the user
    /// key is deleted and `Ok(None)` is returned, so the next read is absent
    /// too.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the medium cannot be read, or
    /// when the corrupt user key cannot be removed.
    pub fn read(&self) -> Result<Option<Session>, ClientError> {
        let Some(raw_token) = self.storage.get(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        let Some(raw_user) = self.storage.get(USER_KEY)? else {
            return Ok(None);
        };
        let Ok(token) = AccessToken::new(raw_token) else {
            return Ok(None);
        };

        match serde_json::from_str::<UserRecord>(&raw_user) {
            Ok(user) => Ok(Some(Session::new(token, user))),
            Err(err) => {
                let corruption = ClientError::corrupt_session(err.to_string());
                warn!(error = %corruption, "discarding unreadable stored user record");
                self.storage.delete(USER_KEY)?;
                Ok(None)
            }
        }
    }

    /// Remove both keys. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when a delete fails.
    pub fn clear(&self) -> Result<(), ClientError> {
        self.storage.delete(ACCESS_TOKEN_KEY)?;
        self.storage.delete(USER_KEY)?;
        Ok(())
    }
}
