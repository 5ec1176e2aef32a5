//! Dashboard loader: the auth gate plus the three-call join.
//!
//! Each [`DashboardLoader::load`] re-reads the session, redirects when it is
//! absent and otherwise fetches statistics, grade distribution and absences
//! concurrently. The outcomes are reduced in call order, so the reported
//! failure never depends on which response arrived first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::ports::{ApiClient, ApiRequest, KeyValueStorage};
use super::{
    AbsenceItem, ClientError, DashboardSnapshot, DashboardState, GradeBucket, Session,
    SessionStore, StatsSummary,
};

/// Statistics summary endpoint.
pub const STATS_PATH: &str = "/api/statistics/dashboard";

/// Grade distribution endpoint.
pub const GRADES_DISTRIBUTION_PATH: &str = "/api/statistics/grades-distribution";

/// Absence list endpoint.
pub const ABSENCES_PATH: &str = "/api/absences/";

/// Result of one source call, internal to the join.
type FetchOutcome<T> = Result<T, ClientError>;

/// The three dashboard sources in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Stats,
    GradeDistribution,
    Absences,
}

impl Source {
    const fn path(self) -> &'static str {
        match self {
            Self::Stats => STATS_PATH,
            Self::GradeDistribution => GRADES_DISTRIBUTION_PATH,
            Self::Absences => ABSENCES_PATH,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::GradeDistribution => "grades",
            Self::Absences => "absences",
        }
    }

    fn failure_message(self, error: &ClientError) -> String {
        format!("{} fetch failed: {error}", self.label())
    }
}

/// Loads the dashboard behind the session gate.
///
/// The latest state is published on a watch channel; late completions from
/// a superseded invocation are dropped instead of overwriting newer state.
pub struct DashboardLoader<S, C> {
    sessions: SessionStore<S>,
    client: Arc<C>,
    generation: AtomicU64,
    state: watch::Sender<DashboardState>,
}

impl<S, C> DashboardLoader<S, C>
where
    S: KeyValueStorage,
    C: ApiClient,
{
    /// Create a loader over the session storage and API client.
    pub fn new(storage: Arc<S>, client: Arc<C>) -> Self {
        let (state, _) = watch::channel(DashboardState::Unauthenticated);
        Self {
            sessions: SessionStore::new(storage),
            client,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Most recently published state.
    pub fn current_state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Mark every in-flight invocation as stale, e.g. on page teardown.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Run the gate and, when authenticated, the three-call join.
    ///
    /// Returns the settled state of this invocation, or `None` when a newer
    /// invocation or [`Self::invalidate`] superseded it while it was in
    /// flight. Nothing is cached between calls.
    pub async fn load(&self) -> Option<DashboardState> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let session = match self.sessions.read() {
            Ok(Some(session)) => session,
            Ok(None) => return self.publish(ticket, DashboardState::Unauthenticated),
            Err(err) => {
                warn!(error = %err, "session storage unreadable; treating as signed out");
                return self.publish(ticket, DashboardState::Unauthenticated);
            }
        };

        self.publish(ticket, DashboardState::Loading)?;

        let (stats, grades, absences) = tokio::join!(
            self.fetch(Source::Stats, &session, decode_object::<StatsSummary>),
            self.fetch(Source::GradeDistribution, &session, decode_list::<GradeBucket>),
            self.fetch(Source::Absences, &session, decode_list::<AbsenceItem>),
        );

        let settled = match reduce(stats, grades, absences) {
            Ok(snapshot) => DashboardState::Ready(snapshot),
            Err(message) => DashboardState::Failed { message },
        };
        self.publish(ticket, settled)
    }

    async fn fetch<T>(
        &self,
        source: Source,
        session: &Session,
        decode: fn(Source, &str) -> FetchOutcome<T>,
    ) -> FetchOutcome<T> {
        let request = ApiRequest::get(source.path()).with_session(session);
        let response = self.client.send(request).await?;
        decode(source, &response.body)
    }

    fn publish(&self, ticket: u64, state: DashboardState) -> Option<DashboardState> {
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "discarding dashboard result from a superseded load");
            return None;
        }
        self.state.send_replace(state.clone());
        Some(state)
    }
}

/// Join reduction: all three or the first failure in declaration order.
fn reduce(
    stats: FetchOutcome<StatsSummary>,
    grades: FetchOutcome<Vec<GradeBucket>>,
    absences: FetchOutcome<Vec<AbsenceItem>>,
) -> Result<DashboardSnapshot, String> {
    match (stats, grades, absences) {
        (Ok(stats), Ok(grade_buckets), Ok(absences)) => Ok(DashboardSnapshot {
            stats,
            grade_buckets,
            absences,
        }),
        (Err(err), _, _) => Err(Source::Stats.failure_message(&err)),
        (_, Err(err), _) => Err(Source::GradeDistribution.failure_message(&err)),
        (_, _, Err(err)) => Err(Source::Absences.failure_message(&err)),
    }
}

fn parse_json(source: Source, body: &str) -> FetchOutcome<Value> {
    serde_json::from_str(body).map_err(|err| {
        ClientError::protocol(format!("{} payload is not valid JSON: {err}", source.label()))
    })
}

fn decode_object<T: DeserializeOwned>(source: Source, body: &str) -> FetchOutcome<T> {
    serde_json::from_value(parse_json(source, body)?).map_err(|err| {
        ClientError::protocol(format!("{} payload has an unexpected shape: {err}", source.label()))
    })
}

/// Decode a list payload. Non-array JSON becomes an empty list; an array
/// with malformed items is a protocol failure.
fn decode_list<T: DeserializeOwned>(source: Source, body: &str) -> FetchOutcome<Vec<T>> {
    let value = parse_json(source, body)?;
    if !value.is_array() {
        warn!(
            source = source.label(),
            "expected a JSON array; substituting an empty list"
        );
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|err| {
        ClientError::protocol(format!("{} payload has malformed items: {err}", source.label()))
    })
}

#[cfg(test)]
#[path = "dashboard_service_tests.rs"]
mod tests;
