use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::destination::{self, DestinationApi};
use crate::diff::{self, DiffOutcome};
use crate::fingerprint::{refreshed_cache, SyncCache};
use crate::relations::{self, CoursePageCache};
use crate::schema::CourseLinkStyle;
use crate::source::SyncPayload;
use crate::state::{
    StateStore, COURSE_PAGE_CACHE_KEY, LAST_SYNC_KEY, LAST_SYNC_RESULT_KEY, SYNC_CACHE_KEY,
};
use crate::upsert::{self, UpsertItem, UpsertOutcome};

/// Minimum interval between run starts. Forced runs bypass the gate.
pub const DEBOUNCE_SECONDS: i64 = 5 * 60;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub courses: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SyncOutcome {
    /// The debounce gate rejected the run.
    Skipped,
    Completed(SyncSummary),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SyncOptions {
    pub force: bool,
}

pub struct SyncEngine<'a> {
    pub destination: &'a dyn DestinationApi,
    pub store: &'a dyn StateStore,
    pub course_collection_id: String,
    pub assignment_collection_id: String,
    pub link_style: CourseLinkStyle,
}

impl SyncEngine<'_> {
    pub async fn run(&self, payload: &SyncPayload, options: SyncOptions) -> Result<SyncOutcome> {
        let started_at = Utc::now();

        if !options.force && self.debounced(started_at).await? {
            info!("sync ran recently, skipping");
            return Ok(SyncOutcome::Skipped);
        }

        let fresh = payload.fresh_records();
        let cache = self.load_sync_cache().await?;
        let outcome = diff::diff(&fresh, &cache);

        let mut summary = SyncSummary {
            skipped: outcome.unchanged.len(),
            courses: payload.courses.len(),
            ..SyncSummary::default()
        };

        if !outcome.has_writes() {
            info!(unchanged = summary.skipped, "nothing to write");
            self.persist(started_at, &fresh, &summary).await?;
            return Ok(SyncOutcome::Completed(summary));
        }

        let failed = self.write_all(payload, &outcome, &mut summary).await?;

        // The cache records the fresh fingerprints for every record, failed
        // writes included; a failed item is not retried until its source
        // data changes again.
        self.persist(started_at, &fresh, &summary).await?;

        info!(
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.skipped,
            failed,
            courses = summary.courses,
            "sync complete"
        );

        Ok(SyncOutcome::Completed(summary))
    }

    async fn debounced(&self, now: DateTime<Utc>) -> Result<bool> {
        let last_sync = self
            .store
            .get(LAST_SYNC_KEY)
            .await?
            .and_then(|value| serde_json::from_value::<DateTime<Utc>>(value).ok());

        Ok(match last_sync {
            Some(last) => now - last < Duration::seconds(DEBOUNCE_SECONDS),
            None => false,
        })
    }

    async fn load_sync_cache(&self) -> Result<SyncCache> {
        let cache = match self.store.get(SYNC_CACHE_KEY).await? {
            Some(value) => {
                serde_json::from_value(value).context("corrupt sync cache, clear it to recover")?
            }
            None => SyncCache::new(),
        };

        Ok(cache)
    }

    async fn load_course_page_cache(&self) -> Result<CoursePageCache> {
        let cache = match self.store.get(COURSE_PAGE_CACHE_KEY).await? {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => CoursePageCache::new(),
        };

        Ok(cache)
    }

    /// Full write path: resolve course pages, index the destination once,
    /// then all creates followed by all updates. Returns the failure tally.
    async fn write_all(
        &self,
        payload: &SyncPayload,
        outcome: &DiffOutcome,
        summary: &mut SyncSummary,
    ) -> Result<usize> {
        let courses: Vec<_> = payload
            .courses
            .iter()
            .map(|entry| entry.course.clone())
            .collect();

        let course_pages = relations::resolve_course_pages(
            self.destination,
            &self.course_collection_id,
            &courses,
            self.load_course_page_cache().await?,
        )
        .await?;
        self.store
            .put(COURSE_PAGE_CACHE_KEY, serde_json::to_value(&course_pages)?)
            .await?;

        let index = destination::build_destination_index(
            self.destination,
            &self.assignment_collection_id,
        )
        .await?;

        let mut failed = 0;
        for assignment in outcome.to_create.iter().chain(outcome.to_update.iter()) {
            let course = payload
                .courses
                .iter()
                .map(|entry| &entry.course)
                .find(|course| course.source_id == assignment.course_source_id);
            let course_name = course.map(|course| course.name.as_str()).unwrap_or("");
            let course_page_id = course_pages
                .get(&assignment.course_source_id)
                .map(String::as_str);

            let item = UpsertItem {
                assignment,
                course_name,
                course_page_id,
            };

            match upsert::upsert_assignment(
                self.destination,
                &self.assignment_collection_id,
                item,
                &index,
                self.link_style,
            )
            .await
            {
                UpsertOutcome::Created => summary.created += 1,
                UpsertOutcome::Updated => summary.updated += 1,
                UpsertOutcome::Failed => failed += 1,
            }
        }

        if failed > 0 {
            warn!(failed, "some assignments were not written");
        }

        Ok(failed)
    }

    async fn persist(
        &self,
        started_at: DateTime<Utc>,
        fresh: &[crate::data::AssignmentData],
        summary: &SyncSummary,
    ) -> Result<()> {
        self.store
            .put(SYNC_CACHE_KEY, json!(refreshed_cache(fresh)))
            .await?;
        self.store.put(LAST_SYNC_KEY, json!(started_at)).await?;
        self.store
            .put(LAST_SYNC_RESULT_KEY, json!(summary))
            .await?;

        Ok(())
    }
}
