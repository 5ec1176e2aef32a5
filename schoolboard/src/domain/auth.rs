//! Login credentials.
//!
//! Keep raw form input outside the login flow by exposing a constructor that
//! validates strings before anything talks to the API port.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

/// Error returned when login form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email is not shaped like `local@domain.tld`.
    #[error("email {0:?} is not a valid address")]
    InvalidEmail(String),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated credentials submitted to the auth endpoint.
///
/// ## Invariants
/// - `email` is trimmed and holds exactly one `@` between a non-empty local
///   part and a dotted domain, with no whitespace.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use schoolboard::domain::{LoginCredentials, LoginValidationError};
///
/// let creds = LoginCredentials::try_from_parts(" admin@school.com ", "admin123").unwrap();
/// assert_eq!(creds.email(), "admin@school.com");
/// assert_eq!(creds.password(), "admin123");
///
/// let err = LoginCredentials::try_from_parts("admin", "admin123").unwrap_err();
/// assert_eq!(err, LoginValidationError::InvalidEmail("admin".to_owned()));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    ///
    /// # Errors
    ///
    /// Returns [`LoginValidationError`] when the email is blank or malformed,
    /// or the password is empty.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !is_email_shaped(normalized) {
            return Err(LoginValidationError::InvalidEmail(normalized.to_owned()));
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address identifying the account.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Structural check only; deliverability is the server's concern.
fn is_email_shaped(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
