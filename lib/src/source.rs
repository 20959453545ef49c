use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::{AssignmentData, CourseData};
use crate::raw_data::RawAssignmentData;

/// Upper bound on pages drained per listing. A server that keeps handing out
/// continuation links past this point gets silently truncated.
pub const MAX_LIST_PAGES: u32 = 20;

/// One page of a source-side listing. `has_more` reflects the continuation
/// link the server sent with this page.
#[derive(Clone, Debug)]
pub struct ListPage {
    pub body: Value,
    pub has_more: bool,
}

/// The paginated-listing capability of the LMS.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn list_children(
        &self,
        course_source_id: &str,
        path: &str,
        page: u32,
    ) -> Result<ListPage>;

    async fn list_courses(&self) -> Result<Vec<CourseData>>;
}

/// The inbound trigger payload the orchestrator runs on.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub parent_domain: String,
    pub source_user_id: Option<String>,
    pub courses: Vec<CoursePayload>,
}

/// One course entry in the payload: the course fields flattened next to its
/// children, not nested under a wrapper key.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayload {
    #[serde(flatten)]
    pub course: CourseData,
    pub children: Vec<AssignmentData>,
}

impl SyncPayload {
    /// All fresh assignment records, flattened in course order.
    pub fn fresh_records(&self) -> Vec<AssignmentData> {
        self.courses
            .iter()
            .flat_map(|course| course.children.iter().cloned())
            .collect()
    }
}

/// Drains the assignment listing for one course. A non-array page body ends
/// the listing without error.
pub async fn collect_course_children(
    api: &dyn SourceApi,
    course: &CourseData,
) -> Result<Vec<AssignmentData>> {
    let mut children = Vec::new();
    let path = format!("courses/{}/assignments", course.source_id);

    for page in 1..=MAX_LIST_PAGES {
        let listed = api.list_children(&course.source_id, &path, page).await?;

        let Some(items) = listed.body.as_array() else {
            break;
        };

        for item in items {
            match serde_json::from_value::<RawAssignmentData>(item.clone()) {
                Ok(raw) => children.push(AssignmentData::from_raw(raw, &course.source_id)),
                Err(error) => {
                    debug!(course = %course.source_id, %error, "skipping unparseable assignment");
                }
            }
        }

        if !listed.has_more {
            break;
        }
    }

    Ok(children)
}

/// Builds the trigger payload. A listing failure drops that course from this
/// run entirely; the rest of the run continues.
pub async fn build_payload(
    api: &dyn SourceApi,
    parent_domain: &str,
    source_user_id: Option<String>,
    courses: Vec<CourseData>,
) -> SyncPayload {
    let mut collected = Vec::new();

    for course in courses {
        match collect_course_children(api, &course).await {
            Ok(children) => collected.push(CoursePayload { course, children }),
            Err(error) => {
                warn!(course = %course.source_id, %error, "listing failed, skipping course");
            }
        }
    }

    SyncPayload {
        parent_domain: parent_domain.to_owned(),
        source_user_id,
        courses: collected,
    }
}
