//! Client-side session: a bearer credential paired with the signed-in user.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Validation errors returned by [`AccessToken::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidationError {
    /// The token was empty or only whitespace.
    EmptyAccessToken,
}

impl fmt::Display for SessionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAccessToken => write!(f, "access token must not be empty"),
        }
    }
}

impl std::error::Error for SessionValidationError {}

/// Opaque bearer credential issued by the auth endpoint.
///
/// ## Invariants
/// - The token is non-empty once trimmed; callers never hold a token that
///   would produce an empty `Authorization` header.
/// - The backing string is zeroed on drop and `Debug` output is redacted.
///
/// # Examples
/// ```
/// use schoolboard::domain::AccessToken;
///
/// let token = AccessToken::new("tok1").unwrap();
/// assert_eq!(token.expose(), "tok1");
/// assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
/// assert!(AccessToken::new("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Validate and wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Result<Self, SessionValidationError> {
        let value = Zeroizing::new(raw.into());
        if value.trim().is_empty() {
            return Err(SessionValidationError::EmptyAccessToken);
        }
        Ok(Self(value))
    }

    /// Raw token text, for storage and header construction only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Profile of the authenticated user as returned by the login endpoint.
///
/// Serialised as `{id, name, email, role}` both on the wire and in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Server-side user identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Role label such as `admin`, `teacher` or `student`.
    pub role: String,
}

impl UserRecord {
    /// Greeting shown once a login completes.
    ///
    /// # Examples
    /// ```
    /// use schoolboard::domain::UserRecord;
    ///
    /// let user = UserRecord {
    ///     id: 1,
    ///     name: "Admin".to_owned(),
    ///     email: "admin@school.com".to_owned(),
    ///     role: "admin".to_owned(),
    /// };
    /// assert_eq!(user.greeting(), "Welcome back, Admin!");
    /// ```
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Welcome back, {}!", self.name)
    }
}

/// A complete session. There is no half-populated form of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    access_token: AccessToken,
    user: UserRecord,
}

impl Session {
    /// Pair a token with its user.
    #[must_use]
    pub const fn new(access_token: AccessToken, user: UserRecord) -> Self {
        Self { access_token, user }
    }

    /// Bearer credential for protected calls.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Signed-in user.
    #[must_use]
    pub const fn user(&self) -> &UserRecord {
        &self.user
    }

    /// Consume the session, keeping only the user.
    #[must_use]
    pub fn into_user(self) -> UserRecord {
        self.user
    }
}
