//! Client configuration loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// API base used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const DEFAULT_STATE_DIR: &str = ".schoolboard";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The base URL does not parse or cannot carry paths.
    #[error("invalid base URL {value:?}: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Configuration for the API client and session store.
///
/// `base_url` always carries a value; the optional fields fall back in their
/// accessors.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCHOOLBOARD")]
pub struct ClientSettings {
    /// Base URL that request paths resolve against.
    #[ortho_config(default = String::from(DEFAULT_BASE_URL))]
    pub base_url: String,
    /// Per-request timeout in milliseconds. Unset means no timeout.
    pub request_timeout_ms: Option<u64>,
    /// Directory holding the persisted session.
    pub state_dir: Option<PathBuf>,
}

impl ClientSettings {
    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] when the configured value is
    /// not an absolute hierarchical URL.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.base_url.as_str();
        let invalid = |reason: String| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            reason,
        };
        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry request paths".to_owned()));
        }
        Ok(url)
    }

    /// Request timeout, if one is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Session state directory, falling back to `.schoolboard`.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }
}
