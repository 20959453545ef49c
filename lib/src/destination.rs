use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::schema::SYNC_KEY_PROPERTY;

/// A destination document: an opaque id plus a property map keyed by field
/// name.
#[derive(Deserialize, Clone, Debug)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Document {
    /// Plain text of a rich-text or title property, if present. Handles both
    /// the read shape (`plain_text`) and the write shape (`text.content`).
    pub fn plain_text(&self, name: &str) -> Option<&str> {
        let property = self.properties.get(name)?;
        let fragments = property
            .get("rich_text")
            .or_else(|| property.get("title"))?
            .as_array()?;
        let first = fragments.first()?;

        first
            .get("plain_text")
            .and_then(Value::as_str)
            .or_else(|| {
                first
                    .get("text")
                    .and_then(|text| text.get("content"))
                    .and_then(Value::as_str)
            })
    }
}

/// Ephemeral per-run index from assignment identity key to destination
/// document id. Rebuilt from a live listing on every run that writes;
/// authoritative for create-vs-update resolution.
pub type DestinationPageIndex = HashMap<String, String>;

/// The document-service capability the engine writes through. Rate limiting
/// and retry live behind this boundary, in the client implementation.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    async fn list_course_documents(&self, collection_id: &str) -> Result<Vec<Document>>;

    async fn create_course_document(
        &self,
        collection_id: &str,
        name: &str,
        identity_key: &str,
    ) -> Result<Document>;

    async fn list_assignment_documents(&self, collection_id: &str) -> Result<Vec<Document>>;

    async fn create_assignment_document(
        &self,
        collection_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Document>;

    async fn update_assignment_document(
        &self,
        document_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Document>;
}

pub async fn build_destination_index(
    api: &dyn DestinationApi,
    collection_id: &str,
) -> Result<DestinationPageIndex> {
    let documents = api.list_assignment_documents(collection_id).await?;
    let mut index = DestinationPageIndex::new();

    for document in documents {
        // Documents without the sync key property were created by hand and
        // are never touched.
        if let Some(key) = document.plain_text(SYNC_KEY_PROPERTY) {
            index.insert(key.to_owned(), document.id.clone());
        }
    }

    Ok(index)
}
