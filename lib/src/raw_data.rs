use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Assignment as the LMS returns it. Fields the platform omits or nulls
/// out are optional here; canonicalization supplies the defaults.
#[derive(Deserialize, Clone, Debug)]
pub struct RawAssignmentData {
    pub id: i64,

    pub name: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub submission: Option<RawSubmissionData>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RawSubmissionData {
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub late: bool,
    #[serde(default)]
    pub missing: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RawCourseData {
    pub id: i64,

    pub name: Option<String>,
    pub course_code: Option<String>,
}
