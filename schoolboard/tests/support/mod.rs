//! Shared doubles for integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use schoolboard::domain::ports::{
    ApiClient, ApiClientError, ApiRequest, ApiResponse, InMemoryKeyValueStorage,
};
use schoolboard::domain::{AccessToken, Session, SessionStore, UserRecord};
use serde_json::Value;

/// One canned reply, delivered after `delay` of (tokio) time.
pub struct ScriptedReply {
    pub delay: Duration,
    pub result: Result<ApiResponse, ApiClientError>,
}

/// API client answering from per-path queues and recording every request.
#[derive(Default)]
pub struct ScriptedApiClient {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `path`.
    pub fn script(
        self,
        path: &str,
        delay_ms: u64,
        result: Result<ApiResponse, ApiClientError>,
    ) -> Self {
        self.scripts
            .lock()
            .expect("script mutex")
            .entry(path.to_owned())
            .or_default()
            .push_back(ScriptedReply {
                delay: Duration::from_millis(delay_ms),
                result,
            });
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("request mutex").clone()
    }
}

#[async_trait]
impl ApiClient for ScriptedApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiClientError> {
        let reply = self
            .scripts
            .lock()
            .expect("script mutex")
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        self.requests.lock().expect("request mutex").push(request);
        match reply {
            Some(ScriptedReply { delay, result }) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Err(ApiClientError::invalid_request(
                "script exhausted for requested path",
            )),
        }
    }
}

pub fn ok_json(body: Value) -> Result<ApiResponse, ApiClientError> {
    Ok(ApiResponse {
        status: 200,
        body: body.to_string(),
    })
}

pub fn admin() -> UserRecord {
    UserRecord {
        id: 1,
        name: "Admin".to_owned(),
        email: "admin@school.com".to_owned(),
        role: "admin".to_owned(),
    }
}

/// Storage holding a valid session for [`admin`] with token `tok1`.
pub fn signed_in_storage() -> Arc<InMemoryKeyValueStorage> {
    let storage = Arc::new(InMemoryKeyValueStorage::default());
    SessionStore::new(Arc::clone(&storage))
        .write(&Session::new(
            AccessToken::new("tok1").expect("token"),
            admin(),
        ))
        .expect("seed session");
    storage
}
