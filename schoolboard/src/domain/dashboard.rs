//! Dashboard aggregate and the state machine exposed to the presentation layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::LOGIN_ROUTE;

/// Headline counters from `GET /api/statistics/dashboard`.
///
/// The server scopes the summary to the caller's role: teachers get no
/// `total_teachers`, students get only grades and absences. Counters the
/// server leaves out stay `None`; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Enrolled students (admin) or students taught (teacher).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_students: Option<u64>,
    /// Teaching staff; admin only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_teachers: Option<u64>,
    /// Classes on record, or the teacher's own classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_classes: Option<u64>,
    /// Subjects on record, or those taught in the teacher's classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_subjects: Option<u64>,
    /// Grades visible to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_grades: Option<u64>,
    /// Absences visible to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_absences: Option<u64>,
}

/// One bar of the grade distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBucket {
    /// Grade label, e.g. `A` or `B+`.
    pub grade: String,
    /// Number of grades in the bucket.
    pub count: u64,
}

/// One row of the recent absences table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceItem {
    /// Absence identifier.
    pub id: i64,
    /// Student display name.
    pub student_name: String,
    /// Day of the absence (ISO `YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Optional free-text reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything the dashboard renders.
///
/// ## Invariants
/// - Built only when all three source calls succeeded; there is no partial
///   snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    /// Headline counters.
    pub stats: StatsSummary,
    /// Grade distribution in server order.
    pub grade_buckets: Vec<GradeBucket>,
    /// Absences in server order.
    pub absences: Vec<AbsenceItem>,
}

/// Dashboard entry state machine: `Unauthenticated → Loading → Ready | Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardState {
    /// No session; the caller must redirect to the login route.
    Unauthenticated,
    /// The three calls are in flight.
    Loading,
    /// Every call succeeded.
    Ready(DashboardSnapshot),
    /// At least one call failed; `message` describes the first in call order.
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl DashboardState {
    /// Route to navigate to, if this state requires leaving the page.
    ///
    /// # Examples
    /// ```
    /// use schoolboard::domain::{DashboardState, LOGIN_ROUTE};
    ///
    /// assert_eq!(DashboardState::Unauthenticated.redirect_target(), Some(LOGIN_ROUTE));
    /// assert_eq!(DashboardState::Loading.redirect_target(), None);
    /// ```
    #[must_use]
    pub const fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some(LOGIN_ROUTE),
            Self::Loading | Self::Ready(_) | Self::Failed { .. } => None,
        }
    }

    /// Whether the state is final for one load invocation.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}
