use serde_json::{json, Map, Value};

use crate::data::{AssignmentData, SubmissionStatus};

/// Property holding the assignment identity key on destination documents.
pub const SYNC_KEY_PROPERTY: &str = "Sync Key";
/// Property holding the course source id on course documents. This is the
/// join key between runs; display names are user-editable and never matched.
pub const COURSE_ID_PROPERTY: &str = "Course ID";

pub const NAME_PROPERTY: &str = "Name";
pub const DUE_PROPERTY: &str = "Due";
pub const POINTS_PROPERTY: &str = "Points";
pub const STATUS_PROPERTY: &str = "Status";
pub const URL_PROPERTY: &str = "URL";
pub const KIND_PROPERTY: &str = "Kind";
pub const COURSE_PROPERTY: &str = "Course";

/// How an assignment document points back at its course: a relation to the
/// course document, or a flat select carrying the course name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CourseLinkStyle {
    Relation,
    SelectName,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssignmentKind {
    PracticeExam,
    Exam,
    Quiz,
    Discussion,
    Project,
    Paper,
    Lab,
    Homework,
    Assignment,
}

impl AssignmentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::PracticeExam => "Practice Exam",
            Self::Exam => "Exam",
            Self::Quiz => "Quiz",
            Self::Discussion => "Discussion",
            Self::Project => "Project",
            Self::Paper => "Paper",
            Self::Lab => "Lab",
            Self::Homework => "Homework",
            Self::Assignment => "Assignment",
        }
    }
}

/// Ordered keyword rules over the lowercased name; first match wins. Rules
/// requiring several keywords sit above the single-keyword rules they would
/// otherwise lose to ("practice exam" before "exam").
const KIND_RULES: &[(&[&str], AssignmentKind)] = &[
    (&["practice", "exam"], AssignmentKind::PracticeExam),
    (&["practice", "test"], AssignmentKind::PracticeExam),
    (&["mock", "exam"], AssignmentKind::PracticeExam),
    (&["final"], AssignmentKind::Exam),
    (&["midterm"], AssignmentKind::Exam),
    (&["exam"], AssignmentKind::Exam),
    (&["quiz"], AssignmentKind::Quiz),
    (&["discussion"], AssignmentKind::Discussion),
    (&["project"], AssignmentKind::Project),
    (&["essay"], AssignmentKind::Paper),
    (&["paper"], AssignmentKind::Paper),
    (&["lab"], AssignmentKind::Lab),
    (&["homework"], AssignmentKind::Homework),
    (&["hw"], AssignmentKind::Homework),
];

pub fn classify_kind(name: &str) -> AssignmentKind {
    let lowered = name.to_lowercase();

    for (keywords, kind) in KIND_RULES {
        if keywords.iter().all(|keyword| lowered.contains(keyword)) {
            return *kind;
        }
    }

    AssignmentKind::Assignment
}

fn status_label(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::Unsubmitted => "Not started",
        SubmissionStatus::Submitted => "Submitted",
        SubmissionStatus::Graded => "Graded",
        SubmissionStatus::Late => "Late",
        SubmissionStatus::Missing => "Missing",
    }
}

/// Destination properties for one assignment. Total and deterministic: a
/// missing due date or URL omits the property rather than writing a null.
pub fn assignment_properties(
    assignment: &AssignmentData,
    course_name: &str,
    course_page_id: Option<&str>,
    link_style: CourseLinkStyle,
) -> Map<String, Value> {
    let mut properties = Map::new();

    properties.insert(
        NAME_PROPERTY.to_owned(),
        json!({ "title": [{ "text": { "content": assignment.name } }] }),
    );
    if let Some(due_at) = assignment.due_at {
        properties.insert(
            DUE_PROPERTY.to_owned(),
            json!({ "date": { "start": due_at.to_rfc3339() } }),
        );
    }
    properties.insert(
        POINTS_PROPERTY.to_owned(),
        json!({ "number": assignment.points_possible }),
    );
    properties.insert(
        STATUS_PROPERTY.to_owned(),
        json!({ "select": { "name": status_label(assignment.submission_status) } }),
    );
    if let Some(url) = &assignment.external_url {
        properties.insert(URL_PROPERTY.to_owned(), json!({ "url": url }));
    }
    properties.insert(
        KIND_PROPERTY.to_owned(),
        json!({ "select": { "name": classify_kind(&assignment.name).label() } }),
    );
    properties.insert(
        SYNC_KEY_PROPERTY.to_owned(),
        json!({ "rich_text": [{ "text": { "content": assignment.identity_key() } }] }),
    );

    match link_style {
        CourseLinkStyle::Relation => {
            if let Some(page_id) = course_page_id {
                properties.insert(
                    COURSE_PROPERTY.to_owned(),
                    json!({ "relation": [{ "id": page_id }] }),
                );
            }
        }
        CourseLinkStyle::SelectName => {
            properties.insert(
                COURSE_PROPERTY.to_owned(),
                json!({ "select": { "name": course_name } }),
            );
        }
    }

    properties
}

/// Destination properties for a new course document. The name is an initial
/// display value only; the identity property is what later runs match on.
pub fn course_properties(name: &str, identity_key: &str) -> Map<String, Value> {
    let mut properties = Map::new();

    properties.insert(
        NAME_PROPERTY.to_owned(),
        json!({ "title": [{ "text": { "content": name } }] }),
    );
    properties.insert(
        COURSE_ID_PROPERTY.to_owned(),
        json!({ "rich_text": [{ "text": { "content": identity_key } }] }),
    );

    properties
}
