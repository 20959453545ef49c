use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{AssignmentData, SubmissionStatus};

/// Identity key -> last-synced fingerprint. Persisted across runs; the sole
/// record of what the destination currently reflects. Clearing it forces a
/// full re-sync.
pub type SyncCache = HashMap<String, Fingerprint>;

/// Projection of the sync-relevant assignment fields. Equality is strict
/// field-wise equality; equal fingerprints mean no destination write.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Fingerprint {
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: f64,
    pub submission_status: SubmissionStatus,
    pub external_url: Option<String>,
}

impl Fingerprint {
    pub fn of(assignment: &AssignmentData) -> Self {
        Self {
            name: assignment.name.clone(),
            due_at: assignment.due_at,
            points_possible: assignment.points_possible,
            submission_status: assignment.submission_status,
            external_url: assignment.external_url.clone(),
        }
    }
}

/// The next cache, covering every fresh record regardless of what happened
/// to its write.
pub fn refreshed_cache(fresh: &[AssignmentData]) -> SyncCache {
    fresh
        .iter()
        .map(|assignment| (assignment.identity_key(), Fingerprint::of(assignment)))
        .collect()
}
