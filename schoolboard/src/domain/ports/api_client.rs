//! Driven port for authenticated calls to the school records REST API.
//!
//! The domain owns the request shape; adapters own header construction, URL
//! resolution against the configured base and transport error mapping.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{AccessToken, Session};

/// HTTP method used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read a resource.
    Get,
    /// Submit a payload.
    Post,
}

/// One outbound API call.
///
/// `path` is either relative to the configured base URL (`/api/absences/`) or
/// an absolute URL carrying its own scheme, which adapters pass through.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Endpoint path or absolute URL.
    pub path: String,
    /// Bearer credential; `None` sends no `Authorization` header.
    pub bearer: Option<AccessToken>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Unauthenticated `GET` for `path`.
    ///
    /// # Examples
    /// ```
    /// use schoolboard::domain::ports::{ApiRequest, HttpMethod};
    ///
    /// let request = ApiRequest::get("/api/absences/");
    /// assert_eq!(request.method, HttpMethod::Get);
    /// assert!(request.bearer.is_none());
    /// ```
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    /// Unauthenticated `POST` for `path`, with an optional JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            bearer: None,
            body,
        }
    }

    /// Bind the request to the session's credential.
    #[must_use]
    pub fn with_session(mut self, session: &Session) -> Self {
        self.bearer = Some(session.access_token().clone());
        self
    }
}

/// Successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

define_port_error! {
    /// Errors surfaced while calling the API.
    pub enum ApiClientError {
        /// Transport failed before a response arrived, including timeouts.
        Network { message: String } => "network error: {message}",
        /// The server answered outside 200–299.
        Http { status: u16, body: String } =>
            "request failed with status {status}: {body}",
        /// The request could not be built (bad URL or header value).
        InvalidRequest { message: String } => "invalid request: {message}",
    }
}

/// Port for issuing API calls.
///
/// Implementations do not retry and do not interpret any status code; that
/// policy belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Send one request and return the 2xx response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiClientError>;
}
