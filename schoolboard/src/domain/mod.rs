//! Domain primitives and services.
//!
//! Purpose: model the client-side session, the login flow and the dashboard
//! aggregation without depending on a concrete storage medium or HTTP stack.
//!
//! Public surface:
//! - Session, AccessToken, UserRecord: the persisted credential pairing.
//! - LoginCredentials: validated email/password input.
//! - DashboardSnapshot, DashboardState: the aggregate shown on entry.
//! - SessionStore, LoginFlow, DashboardLoader: the services.
//! - ClientError: the error taxonomy surfaced to the presentation layer.

pub mod auth;
pub mod dashboard;
pub mod dashboard_service;
pub mod error;
pub mod login_service;
pub mod ports;
pub mod routes;
pub mod session;
pub mod session_store;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::dashboard::{
    AbsenceItem, DashboardSnapshot, DashboardState, GradeBucket, StatsSummary,
};
pub use self::dashboard_service::{
    ABSENCES_PATH, DashboardLoader, GRADES_DISTRIBUTION_PATH, STATS_PATH,
};
pub use self::error::ClientError;
pub use self::login_service::{LOGIN_PATH, LOGOUT_PATH, LoginFlow};
pub use self::routes::{DASHBOARD_ROUTE, LOGIN_ROUTE};
pub use self::session::{AccessToken, Session, SessionValidationError, UserRecord};
pub use self::session_store::{ACCESS_TOKEN_KEY, SessionStore, USER_KEY};
