//! Navigation targets signalled by the login flow and the dashboard gate.

/// Route the presentation layer shows when no valid session exists.
pub const LOGIN_ROUTE: &str = "/login";

/// Route the presentation layer opens once a session has been written.
pub const DASHBOARD_ROUTE: &str = "/dashboard";
