use crate::data::AssignmentData;
use crate::fingerprint::{Fingerprint, SyncCache};

/// Fresh records partitioned against the persisted cache. Order within each
/// bucket follows input order.
#[derive(Clone, Debug, Default)]
pub struct DiffOutcome {
    pub to_create: Vec<AssignmentData>,
    pub to_update: Vec<AssignmentData>,
    pub unchanged: Vec<AssignmentData>,
}

impl DiffOutcome {
    pub fn has_writes(&self) -> bool {
        !self.to_create.is_empty() || !self.to_update.is_empty()
    }
}

/// Pure classification: absent from the cache means create, a differing
/// fingerprint means update, an identical one means unchanged. The cache is
/// authoritative for change detection; it says nothing about whether a
/// destination document actually exists (the upsert engine re-checks that
/// against the live destination index).
pub fn diff(fresh: &[AssignmentData], cache: &SyncCache) -> DiffOutcome {
    let mut outcome = DiffOutcome::default();

    for assignment in fresh {
        match cache.get(&assignment.identity_key()) {
            None => outcome.to_create.push(assignment.clone()),
            Some(known) if *known != Fingerprint::of(assignment) => {
                outcome.to_update.push(assignment.clone())
            }
            Some(_) => outcome.unchanged.push(assignment.clone()),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::data::SubmissionStatus;
    use crate::fingerprint::refreshed_cache;

    fn assignment(source_id: &str, name: &str) -> AssignmentData {
        AssignmentData {
            source_id: source_id.to_owned(),
            course_source_id: "1".to_owned(),
            name: name.to_owned(),
            due_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            points_possible: 10.0,
            external_url: None,
            submission_status: SubmissionStatus::Unsubmitted,
        }
    }

    #[test]
    fn empty_cache_classifies_everything_as_create() {
        let fresh = vec![assignment("100", "HW1"), assignment("101", "HW2")];

        let outcome = diff(&fresh, &SyncCache::new());

        assert_eq!(outcome.to_create.len(), 2);
        assert!(outcome.to_update.is_empty());
        assert!(outcome.unchanged.is_empty());
    }

    #[test]
    fn changed_fingerprint_classifies_as_update() {
        let fresh = vec![assignment("100", "HW1")];
        let cache = refreshed_cache(&fresh);

        let changed = vec![assignment("100", "HW1 (revised)")];
        let outcome = diff(&changed, &cache);

        assert!(outcome.to_create.is_empty());
        assert_eq!(outcome.to_update.len(), 1);
        assert!(outcome.unchanged.is_empty());
    }

    #[test]
    fn diff_is_idempotent_against_its_own_cache() {
        let fresh = vec![
            assignment("100", "HW1"),
            assignment("101", "HW2"),
            assignment("102", "HW3"),
        ];

        let first = diff(&fresh, &SyncCache::new());
        assert_eq!(first.to_create.len(), 3);

        let cache = refreshed_cache(&fresh);
        let second = diff(&fresh, &cache);

        assert!(second.to_create.is_empty());
        assert!(second.to_update.is_empty());
        assert_eq!(second.unchanged.len(), 3);
    }

    #[test]
    fn bucket_order_follows_input_order() {
        let fresh = vec![
            assignment("103", "HW4"),
            assignment("100", "HW1"),
            assignment("101", "HW2"),
        ];

        let outcome = diff(&fresh, &SyncCache::new());
        let ids: Vec<_> = outcome
            .to_create
            .iter()
            .map(|a| a.source_id.as_str())
            .collect();

        assert_eq!(ids, vec!["103", "100", "101"]);
    }
}
