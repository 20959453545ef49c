use tracing::{debug, warn};

use crate::data::AssignmentData;
use crate::destination::{DestinationApi, DestinationPageIndex};
use crate::schema::{self, CourseLinkStyle};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Failed,
}

/// One assignment plus its resolved course context.
pub struct UpsertItem<'a> {
    pub assignment: &'a AssignmentData,
    pub course_name: &'a str,
    pub course_page_id: Option<&'a str>,
}

/// Writes one assignment to the destination. The live index wins over the
/// diff classification: an identity key already present in the destination
/// gets an update even when the cache said create, so a cleared cache never
/// produces duplicate documents. Failures are absorbed into the outcome;
/// the caller's loop keeps going.
pub async fn upsert_assignment(
    api: &dyn DestinationApi,
    collection_id: &str,
    item: UpsertItem<'_>,
    index: &DestinationPageIndex,
    link_style: CourseLinkStyle,
) -> UpsertOutcome {
    let identity_key = item.assignment.identity_key();
    let properties = schema::assignment_properties(
        item.assignment,
        item.course_name,
        item.course_page_id,
        link_style,
    );

    let result = match index.get(&identity_key) {
        Some(document_id) => api
            .update_assignment_document(document_id, properties)
            .await
            .map(|_| UpsertOutcome::Updated),
        None => api
            .create_assignment_document(collection_id, properties)
            .await
            .map(|_| UpsertOutcome::Created),
    };

    match result {
        Ok(outcome) => {
            debug!(key = %identity_key, ?outcome, "upserted assignment");
            outcome
        }
        Err(error) => {
            warn!(key = %identity_key, %error, "upsert failed");
            UpsertOutcome::Failed
        }
    }
}
