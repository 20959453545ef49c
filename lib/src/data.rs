use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::raw_data::{RawAssignmentData, RawCourseData, RawSubmissionData};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Unsubmitted,
    Submitted,
    Graded,
    Late,
    Missing,
}

impl SubmissionStatus {
    fn from_submission(submission: Option<&RawSubmissionData>) -> Self {
        let Some(submission) = submission else {
            return Self::Unsubmitted;
        };

        if submission.missing {
            return Self::Missing;
        }
        if submission.late {
            return Self::Late;
        }

        match submission.workflow_state.as_deref() {
            Some("graded") => Self::Graded,
            Some("submitted") | Some("pending_review") => Self::Submitted,
            _ => Self::Unsubmitted,
        }
    }
}

/// Canonical assignment, rebuilt fresh every run. Identity across runs is
/// `course_source_id:source_id`, independent of either system's document ids.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AssignmentData {
    pub source_id: String,
    pub course_source_id: String,

    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: f64,
    pub external_url: Option<String>,
    pub submission_status: SubmissionStatus,
}

impl AssignmentData {
    pub fn from_raw(raw: RawAssignmentData, course_source_id: &str) -> Self {
        let submission_status = SubmissionStatus::from_submission(raw.submission.as_ref());

        Self {
            source_id: raw.id.to_string(),
            course_source_id: course_source_id.to_owned(),
            name: raw.name.unwrap_or_default(),
            due_at: raw.due_at,
            points_possible: raw.points_possible.unwrap_or(0.0),
            external_url: raw.html_url,
            submission_status,
        }
    }

    pub fn identity_key(&self) -> String {
        format!("{}:{}", self.course_source_id, self.source_id)
    }
}

/// Canonical course. Identity across runs is the source-side id alone.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CourseData {
    pub source_id: String,

    pub name: String,
    pub code: String,
}

impl From<RawCourseData> for CourseData {
    fn from(raw: RawCourseData) -> Self {
        Self {
            source_id: raw.id.to_string(),
            name: raw.name.unwrap_or_default(),
            code: raw.course_code.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_assignment() -> RawAssignmentData {
        RawAssignmentData {
            id: 100,
            name: Some("HW1".to_owned()),
            due_at: None,
            points_possible: Some(10.0),
            html_url: None,
            submission: None,
        }
    }

    #[test]
    fn identity_key_is_composite_and_stable() {
        let assignment = AssignmentData::from_raw(raw_assignment(), "1");

        assert_eq!(assignment.identity_key(), "1:100");
    }

    #[test]
    fn missing_optionals_default_deterministically() {
        let raw = RawAssignmentData {
            name: None,
            points_possible: None,
            ..raw_assignment()
        };
        let assignment = AssignmentData::from_raw(raw, "1");

        assert_eq!(assignment.name, "");
        assert_eq!(assignment.points_possible, 0.0);
        assert_eq!(assignment.due_at, None);
        assert_eq!(assignment.submission_status, SubmissionStatus::Unsubmitted);
    }

    #[test]
    fn missing_flag_wins_over_workflow_state() {
        let submission = RawSubmissionData {
            workflow_state: Some("submitted".to_owned()),
            late: true,
            missing: true,
        };

        assert_eq!(
            SubmissionStatus::from_submission(Some(&submission)),
            SubmissionStatus::Missing
        );
    }

    #[test]
    fn unknown_workflow_state_maps_to_unsubmitted() {
        let submission = RawSubmissionData {
            workflow_state: Some("unexpected".to_owned()),
            late: false,
            missing: false,
        };

        assert_eq!(
            SubmissionStatus::from_submission(Some(&submission)),
            SubmissionStatus::Unsubmitted
        );
    }
}
