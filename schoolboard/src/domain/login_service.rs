//! Login and logout flows.
//!
//! A successful login writes the session before returning, so any protected
//! page loaded afterwards observes a complete session. Rejections and
//! malformed responses leave the store untouched.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{ApiClient, ApiClientError, ApiRequest, KeyValueStorage};
use super::{
    AccessToken, ClientError, LOGIN_ROUTE, LoginCredentials, Session, SessionStore, UserRecord,
};

/// Credential exchange endpoint.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Server-side token revocation endpoint.
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Body of a successful login. `token_type` and `refresh_token` are accepted
/// and ignored.
#[derive(Debug, Deserialize)]
struct LoginResponseDto {
    access_token: String,
    user: UserRecord,
}

impl LoginResponseDto {
    fn into_session(self) -> Result<Session, ClientError> {
        let token = AccessToken::new(self.access_token)
            .map_err(|err| ClientError::protocol(format!("login response: {err}")))?;
        Ok(Session::new(token, self.user))
    }
}

/// Drives credential submission and sign-out against the session store.
pub struct LoginFlow<S, C> {
    sessions: SessionStore<S>,
    client: Arc<C>,
}

impl<S, C> LoginFlow<S, C>
where
    S: KeyValueStorage,
    C: ApiClient,
{
    /// Create a flow over the session storage and API client.
    pub const fn new(storage: Arc<S>, client: Arc<C>) -> Self {
        Self {
            sessions: SessionStore::new(storage),
            client,
        }
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Returns the authenticated user once the session write has completed.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] with the response body when the server answers
    ///   outside 2xx.
    /// - [`ClientError::Network`] when no response arrives.
    /// - [`ClientError::Protocol`] when a 2xx body is not a login response.
    /// - [`ClientError::Storage`] when the session cannot be written.
    pub async fn submit(&self, credentials: &LoginCredentials) -> Result<UserRecord, ClientError> {
        let body = json!({
            "email": credentials.email(),
            "password": credentials.password(),
        });
        let response = self
            .client
            .send(ApiRequest::post(LOGIN_PATH, Some(body)))
            .await
            .map_err(map_login_error)?;

        let session = parse_login_response(&response.body)?;
        self.sessions.write(&session)?;
        info!(user_id = session.user().id, role = %session.user().role, "login succeeded");
        Ok(session.into_user())
    }

    /// User of the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the store cannot be read.
    pub fn current_user(&self) -> Result<Option<UserRecord>, ClientError> {
        Ok(self.sessions.read()?.map(Session::into_user))
    }

    /// Revoke the server-side session when possible, then clear local state.
    ///
    /// The revocation call is best effort: its failure is logged and the
    /// local session is cleared regardless. Returns the route to show next.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the store cannot be cleared.
    pub async fn sign_out(&self) -> Result<&'static str, ClientError> {
        match self.sessions.read() {
            Ok(Some(session)) => {
                let request = ApiRequest::post(LOGOUT_PATH, None).with_session(&session);
                if let Err(err) = self.client.send(request).await {
                    warn!(error = %err, "logout request failed; clearing local session anyway");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not read session before logout"),
        }

        self.sessions.clear()?;
        info!("signed out");
        Ok(LOGIN_ROUTE)
    }
}

fn map_login_error(error: ApiClientError) -> ClientError {
    match error {
        ApiClientError::Http { body, .. } => ClientError::auth(body),
        other => other.into(),
    }
}

fn parse_login_response(body: &str) -> Result<Session, ClientError> {
    serde_json::from_str::<LoginResponseDto>(body)
        .map_err(|err| ClientError::protocol(format!("login response has an unexpected shape: {err}")))?
        .into_session()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        ApiResponse, HttpMethod, InMemoryKeyValueStorage, MockApiClient,
    };
    use crate::domain::{ACCESS_TOKEN_KEY, USER_KEY};
    use rstest::{fixture, rstest};
    use std::collections::BTreeMap;

    fn admin() -> UserRecord {
        UserRecord {
            id: 1,
            name: "Admin".to_owned(),
            email: "admin@school.com".to_owned(),
            role: "admin".to_owned(),
        }
    }

    #[fixture]
    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("admin@school.com", "admin123").expect("credentials")
    }

    fn client_returning(
        result: Result<ApiResponse, ApiClientError>,
    ) -> MockApiClient {
        let mut client = MockApiClient::new();
        client.expect_send().times(1).return_once(move |request| {
            assert_eq!(request.method, HttpMethod::Post);
            assert_eq!(request.path, LOGIN_PATH);
            assert!(request.bearer.is_none(), "login never sends a bearer token");
            assert_eq!(
                request.body,
                Some(json!({"email": "admin@school.com", "password": "admin123"}))
            );
            result
        });
        client
    }

    fn ok(body: &str) -> Result<ApiResponse, ApiClientError> {
        Ok(ApiResponse {
            status: 200,
            body: body.to_owned(),
        })
    }

    #[rstest]
    #[tokio::test]
    async fn successful_login_writes_the_session(credentials: LoginCredentials) {
        let storage = Arc::new(InMemoryKeyValueStorage::default());
        let client = client_returning(ok(
            r#"{"access_token":"tok1","token_type":"bearer","refresh_token":"r1",
                "user":{"id":1,"name":"Admin","email":"admin@school.com","role":"admin"}}"#,
        ));
        let flow = LoginFlow::new(Arc::clone(&storage), Arc::new(client));

        let user = flow.submit(&credentials).await.expect("login succeeds");

        assert_eq!(user, admin());
        let stored = SessionStore::new(Arc::clone(&storage))
            .read()
            .expect("read succeeds")
            .expect("session present");
        assert_eq!(stored.access_token().expose(), "tok1");
        assert_eq!(stored.user(), &admin());
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_login_leaves_the_store_untouched(credentials: LoginCredentials) {
        let storage = Arc::new(InMemoryKeyValueStorage::with_entries([
            (ACCESS_TOKEN_KEY, "previous"),
            (USER_KEY, "{\"id\":9,\"name\":\"Old\",\"email\":\"old@school.com\",\"role\":\"teacher\"}"),
        ]));
        let before: BTreeMap<String, String> = storage.snapshot();
        let client = client_returning(Err(ApiClientError::http(401_u16, "bad credentials")));
        let flow = LoginFlow::new(Arc::clone(&storage), Arc::new(client));

        let err = flow.submit(&credentials).await.expect_err("login must fail");

        assert_eq!(err, ClientError::auth("bad credentials"));
        assert_eq!(storage.snapshot(), before);
    }

    #[rstest]
    #[case::not_json("<html>oops</html>")]
    #[case::missing_user(r#"{"access_token":"tok1"}"#)]
    #[case::blank_token(
        r#"{"access_token":" ","user":{"id":1,"name":"Admin","email":"admin@school.com","role":"admin"}}"#
    )]
    #[tokio::test]
    async fn malformed_success_bodies_are_protocol_errors(
        credentials: LoginCredentials,
        #[case] body: &str,
    ) {
        let storage = Arc::new(InMemoryKeyValueStorage::default());
        let flow = LoginFlow::new(Arc::clone(&storage), Arc::new(client_returning(ok(body))));

        let err = flow.submit(&credentials).await.expect_err("login must fail");

        assert!(matches!(err, ClientError::Protocol { .. }), "got {err:?}");
        assert!(storage.snapshot().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn network_failures_are_not_auth_errors(credentials: LoginCredentials) {
        let storage = Arc::new(InMemoryKeyValueStorage::default());
        let client = client_returning(Err(ApiClientError::network("connection refused")));
        let flow = LoginFlow::new(Arc::clone(&storage), Arc::new(client));

        let err = flow.submit(&credentials).await.expect_err("login must fail");

        assert_eq!(err, ClientError::network("connection refused"));
        assert!(storage.snapshot().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn sign_out_clears_even_when_revocation_fails() {
        let storage = Arc::new(InMemoryKeyValueStorage::default());
        SessionStore::new(Arc::clone(&storage))
            .write(&Session::new(AccessToken::new("tok1").expect("token"), admin()))
            .expect("seed session");

        let mut client = MockApiClient::new();
        client.expect_send().times(1).return_once(|request| {
            assert_eq!(request.path, LOGOUT_PATH);
            assert_eq!(request.bearer.as_ref().map(AccessToken::expose), Some("tok1"));
            Err(ApiClientError::http(500_u16, "boom"))
        });
        let flow = LoginFlow::new(Arc::clone(&storage), Arc::new(client));

        let route = flow.sign_out().await.expect("sign out succeeds");

        assert_eq!(route, LOGIN_ROUTE);
        assert!(storage.snapshot().is_empty());
        assert_eq!(flow.current_user().expect("read succeeds"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn sign_out_without_session_skips_the_server() {
        let mut client = MockApiClient::new();
        client.expect_send().times(0);
        let flow = LoginFlow::new(
            Arc::new(InMemoryKeyValueStorage::default()),
            Arc::new(client),
        );

        assert_eq!(flow.sign_out().await.expect("sign out succeeds"), LOGIN_ROUTE);
    }
}
