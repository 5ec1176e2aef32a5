//! Reqwest-backed API client.
//!
//! This adapter owns URL resolution, header construction, the optional
//! request timeout and mapping of transport and status failures. It never
//! retries and never interprets a status beyond "2xx or not".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use tracing::debug;

use crate::domain::AccessToken;
use crate::domain::ports::{ApiClient, ApiClientError, ApiRequest, ApiResponse, HttpMethod};

/// API client that resolves request paths against one base URL.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
}

impl HttpApiClient {
    /// Build a client for `base_url`.
    ///
    /// `timeout` bounds each request end to end; `None` leaves requests
    /// unbounded.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let builder = Client::builder();
        let client = match timeout {
            Some(limit) => builder.timeout(limit),
            None => builder,
        }
        .build()?;
        Ok(Self { client, base_url })
    }

    /// Configured base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve_url(&self, path: &str) -> Result<Url, ApiClientError> {
        let target = if has_scheme(path) {
            path.to_owned()
        } else {
            let base = self.base_url.as_str().trim_end_matches('/');
            if path.starts_with('/') {
                format!("{base}{path}")
            } else {
                format!("{base}/{path}")
            }
        };
        Url::parse(&target)
            .map_err(|err| ApiClientError::invalid_request(format!("invalid URL {target}: {err}")))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiClientError> {
        let url = self.resolve_url(&request.path)?;
        let headers = build_headers(request.bearer.as_ref())?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        debug!(
            method = %method,
            url = %url,
            authenticated = request.bearer.is_some(),
            "sending API request"
        );

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.json(&body);
        }
        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(ApiClientError::http(status.as_u16(), body));
        }
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn has_scheme(path: &str) -> bool {
    path.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn build_headers(bearer: Option<&AccessToken>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| ApiClientError::invalid_request("access token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn map_transport_error(error: reqwest::Error) -> ApiClientError {
    if error.is_timeout() {
        ApiClientError::network(format!("request timed out: {error}"))
    } else {
        ApiClientError::network(error.to_string())
    }
}
