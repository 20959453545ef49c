use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use crate::data::CourseData;
use crate::destination::DestinationApi;
use crate::schema::COURSE_ID_PROPERTY;

/// Course source id -> destination document id. Persisted, but the live
/// destination listing overrides it on every full run: the destination owns
/// the id-to-course binding, the cache only shortcuts it.
pub type CoursePageCache = HashMap<String, String>;

/// Ensures a course document exists for every course referenced this run and
/// returns the merged mapping. Existing documents are matched on the
/// immutable identity property, never on the display name, so users can
/// rename course pages freely. Names on existing documents are never
/// overwritten. Zero courses degrades to returning the cache untouched.
pub async fn resolve_course_pages(
    api: &dyn DestinationApi,
    collection_id: &str,
    courses: &[CourseData],
    cached: CoursePageCache,
) -> Result<CoursePageCache> {
    if courses.is_empty() {
        return Ok(cached);
    }

    let mut pages = cached;

    for document in api.list_course_documents(collection_id).await? {
        if let Some(course_id) = document.plain_text(COURSE_ID_PROPERTY) {
            pages.insert(course_id.to_owned(), document.id.clone());
        }
    }

    for course in courses {
        if pages.contains_key(&course.source_id) {
            continue;
        }

        match api
            .create_course_document(collection_id, &course.name, &course.source_id)
            .await
        {
            Ok(document) => {
                debug!(course = %course.source_id, document = %document.id, "created course page");
                pages.insert(course.source_id.clone(), document.id);
            }
            Err(error) => {
                warn!(course = %course.source_id, %error, "failed to create course page");
            }
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::destination::Document;
    use crate::schema;

    #[derive(Default)]
    struct FakeDestination {
        course_documents: Mutex<Vec<Document>>,
        created: Mutex<usize>,
    }

    impl FakeDestination {
        fn with_course(self, id: &str, name: &str, identity_key: &str) -> Self {
            self.course_documents.lock().unwrap().push(Document {
                id: id.to_owned(),
                properties: schema::course_properties(name, identity_key),
            });
            self
        }
    }

    #[async_trait]
    impl DestinationApi for FakeDestination {
        async fn list_course_documents(&self, _collection_id: &str) -> Result<Vec<Document>> {
            Ok(self.course_documents.lock().unwrap().clone())
        }

        async fn create_course_document(
            &self,
            _collection_id: &str,
            name: &str,
            identity_key: &str,
        ) -> Result<Document> {
            *self.created.lock().unwrap() += 1;
            let document = Document {
                id: format!("course-page-{identity_key}"),
                properties: schema::course_properties(name, identity_key),
            };
            self.course_documents
                .lock()
                .unwrap()
                .push(document.clone());
            Ok(document)
        }

        async fn list_assignment_documents(&self, _collection_id: &str) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn create_assignment_document(
            &self,
            _collection_id: &str,
            _properties: Map<String, Value>,
        ) -> Result<Document> {
            unreachable!("relation resolution never writes assignments")
        }

        async fn update_assignment_document(
            &self,
            _document_id: &str,
            _properties: Map<String, Value>,
        ) -> Result<Document> {
            unreachable!("relation resolution never writes assignments")
        }
    }

    fn course(source_id: &str, name: &str) -> CourseData {
        CourseData {
            source_id: source_id.to_owned(),
            name: name.to_owned(),
            code: "BIO-101".to_owned(),
        }
    }

    #[tokio::test]
    async fn creates_documents_for_unknown_courses_only() {
        let api = FakeDestination::default().with_course("page-1", "Biology", "1");

        let pages = resolve_course_pages(
            &api,
            "courses",
            &[course("1", "Biology"), course("2", "Chemistry")],
            CoursePageCache::new(),
        )
        .await
        .unwrap();

        assert_eq!(*api.created.lock().unwrap(), 1);
        assert_eq!(pages["1"], "page-1");
        assert_eq!(pages["2"], "course-page-2");
    }

    #[tokio::test]
    async fn renamed_documents_still_match_on_the_identity_property() {
        // User renamed the page; the identity property still says course 1.
        let api = FakeDestination::default().with_course("page-1", "My Bio Notes", "1");

        let pages = resolve_course_pages(
            &api,
            "courses",
            &[course("1", "Biology")],
            CoursePageCache::new(),
        )
        .await
        .unwrap();

        assert_eq!(*api.created.lock().unwrap(), 0);
        assert_eq!(pages["1"], "page-1");
    }

    #[tokio::test]
    async fn live_listing_overrides_a_stale_cache() {
        let api = FakeDestination::default().with_course("page-new", "Biology", "1");
        let mut cached = CoursePageCache::new();
        cached.insert("1".to_owned(), "page-stale".to_owned());

        let pages = resolve_course_pages(&api, "courses", &[course("1", "Biology")], cached)
            .await
            .unwrap();

        assert_eq!(pages["1"], "page-new");
    }

    #[tokio::test]
    async fn zero_courses_returns_the_cache_untouched() {
        let api = FakeDestination::default();
        let mut cached = CoursePageCache::new();
        cached.insert("1".to_owned(), "page-1".to_owned());

        let pages = resolve_course_pages(&api, "courses", &[], cached.clone())
            .await
            .unwrap();

        assert_eq!(pages, cached);
    }
}
