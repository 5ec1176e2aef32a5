//! Behaviour tests for the login flow and its hand-off to the dashboard.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use schoolboard::domain::ports::{ApiClientError, ApiResponse, InMemoryKeyValueStorage};
use schoolboard::domain::{
    ABSENCES_PATH, ACCESS_TOKEN_KEY, AccessToken, ClientError, DashboardLoader, DashboardState,
    GRADES_DISTRIBUTION_PATH, LOGIN_PATH, LOGOUT_PATH, LoginCredentials, LoginFlow, STATS_PATH,
    SessionStore, USER_KEY, UserRecord,
};
use serde_json::json;
use tokio::runtime::Runtime;

mod support;

use support::{ScriptedApiClient, ok_json};

struct LoginWorld {
    runtime: Runtime,
    storage: RefCell<Arc<InMemoryKeyValueStorage>>,
    script: RefCell<ScriptedApiClient>,
    client: RefCell<Option<Arc<ScriptedApiClient>>>,
    before: RefCell<BTreeMap<String, String>>,
    outcome: RefCell<Option<Result<UserRecord, ClientError>>>,
    next_route: RefCell<Option<&'static str>>,
}

impl LoginWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        Self {
            runtime,
            storage: RefCell::new(Arc::new(InMemoryKeyValueStorage::default())),
            script: RefCell::new(ScriptedApiClient::new()),
            client: RefCell::new(None),
            before: RefCell::new(BTreeMap::new()),
            outcome: RefCell::new(None),
            next_route: RefCell::new(None),
        }
    }

    fn add_reply(&self, path: &str, result: Result<ApiResponse, ApiClientError>) {
        let script = self.script.take();
        *self.script.borrow_mut() = script.script(path, 0, result);
    }

    fn client(&self) -> Arc<ScriptedApiClient> {
        let mut slot = self.client.borrow_mut();
        let client = slot.get_or_insert_with(|| Arc::new(self.script.take()));
        Arc::clone(client)
    }

    fn storage(&self) -> Arc<InMemoryKeyValueStorage> {
        Arc::clone(&self.storage.borrow())
    }

    fn flow(&self) -> LoginFlow<InMemoryKeyValueStorage, ScriptedApiClient> {
        LoginFlow::new(self.storage(), self.client())
    }

    fn dashboard_state(&self) -> DashboardState {
        let loader = DashboardLoader::new(self.storage(), self.client());
        self.runtime
            .block_on(loader.load())
            .expect("load is current")
    }
}

#[fixture]
fn world() -> LoginWorld {
    LoginWorld::new()
}

#[given("an empty session store")]
fn an_empty_session_store(world: &LoginWorld) {
    *world.storage.borrow_mut() = Arc::new(InMemoryKeyValueStorage::default());
}

#[given("a session store holding a previous session")]
fn a_session_store_holding_a_previous_session(world: &LoginWorld) {
    let storage = Arc::new(InMemoryKeyValueStorage::with_entries([
        (ACCESS_TOKEN_KEY, "previous"),
        (
            USER_KEY,
            r#"{"id":9,"name":"Dana","email":"dana@school.com","role":"teacher"}"#,
        ),
    ]));
    *world.before.borrow_mut() = storage.snapshot();
    *world.storage.borrow_mut() = storage;
}

#[given("the auth endpoint accepts the credentials")]
fn the_auth_endpoint_accepts_the_credentials(world: &LoginWorld) {
    world.add_reply(
        LOGIN_PATH,
        ok_json(json!({
            "access_token": "tok1",
            "refresh_token": "r1",
            "token_type": "bearer",
            "user": {"id": 1, "name": "Admin", "email": "admin@school.com", "role": "admin"}
        })),
    );
    world.add_reply(
        STATS_PATH,
        ok_json(json!({
            "total_students": 1234,
            "total_teachers": 87,
            "total_classes": 42,
            "total_absences": 19
        })),
    );
    world.add_reply(GRADES_DISTRIBUTION_PATH, ok_json(json!([])));
    world.add_reply(ABSENCES_PATH, ok_json(json!([])));
}

#[given("the auth endpoint rejects the credentials")]
fn the_auth_endpoint_rejects_the_credentials(world: &LoginWorld) {
    world.add_reply(
        LOGIN_PATH,
        Err(ApiClientError::http(401_u16, "Incorrect email or password")),
    );
}

#[given("the logout endpoint is unavailable")]
fn the_logout_endpoint_is_unavailable(world: &LoginWorld) {
    world.add_reply(LOGOUT_PATH, Err(ApiClientError::network("connection refused")));
}

#[when("the user signs in as {email}")]
fn the_user_signs_in_as(world: &LoginWorld, email: String) {
    let credentials =
        LoginCredentials::try_from_parts(&email, "admin123").expect("valid credentials");
    let flow = world.flow();
    let outcome = world.runtime.block_on(flow.submit(&credentials));
    *world.outcome.borrow_mut() = Some(outcome);
}

#[when("the user signs out")]
fn the_user_signs_out(world: &LoginWorld) {
    let flow = world.flow();
    let route = world
        .runtime
        .block_on(flow.sign_out())
        .expect("sign out succeeds");
    *world.next_route.borrow_mut() = Some(route);
}

#[then("the greeting reads \"{greeting}\"")]
fn the_greeting_reads(world: &LoginWorld, greeting: String) {
    let outcome = world.outcome.borrow();
    let user = match outcome.as_ref().expect("login attempted") {
        Ok(user) => user,
        Err(err) => panic!("expected login to succeed, got {err}"),
    };
    assert_eq!(user.greeting(), greeting);
}

#[then("the stored session carries token {token}")]
fn the_stored_session_carries_token(world: &LoginWorld, token: String) {
    let session = SessionStore::new(world.storage())
        .read()
        .expect("read succeeds")
        .expect("session present");
    assert_eq!(session.access_token().expose(), token);
}

#[then("the dashboard loads with the stored token")]
fn the_dashboard_loads_with_the_stored_token(world: &LoginWorld) {
    let state = world.dashboard_state();
    assert!(matches!(state, DashboardState::Ready(_)), "got {state:?}");

    let requests = world.client().requests();
    let dashboard_calls: Vec<_> = requests
        .iter()
        .filter(|request| request.path != LOGIN_PATH)
        .collect();
    assert_eq!(dashboard_calls.len(), 3);
    for request in dashboard_calls {
        assert_eq!(request.bearer.as_ref().map(AccessToken::expose), Some("tok1"));
    }
}

#[then("the login fails with \"{message}\"")]
fn the_login_fails_with(world: &LoginWorld, message: String) {
    let outcome = world.outcome.borrow();
    match outcome.as_ref().expect("login attempted") {
        Ok(user) => panic!("expected login to fail, got {user:?}"),
        Err(err) => assert_eq!(err.to_string(), message),
    }
}

#[then("the session store is unchanged")]
fn the_session_store_is_unchanged(world: &LoginWorld) {
    assert_eq!(world.storage().snapshot(), *world.before.borrow());
}

#[then("the next route is {route}")]
fn the_next_route_is(world: &LoginWorld, route: String) {
    assert_eq!(*world.next_route.borrow(), Some(route.as_str()));
}

#[then("the dashboard redirects to {route}")]
fn the_dashboard_redirects_to(world: &LoginWorld, route: String) {
    let state = world.dashboard_state();
    assert_eq!(state.redirect_target(), Some(route.as_str()));
}

#[scenario(
    path = "tests/features/login.feature",
    name = "Valid credentials store a session before the dashboard loads"
)]
fn valid_credentials_store_a_session(world: LoginWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/login.feature",
    name = "Rejected credentials leave the previous session untouched"
)]
fn rejected_credentials_leave_the_session_untouched(world: LoginWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/login.feature",
    name = "Signing out returns to the login page"
)]
fn signing_out_returns_to_the_login_page(world: LoginWorld) {
    drop(world);
}
