use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use coursework_sync::destination::DestinationApi;
use coursework_sync::{schema, Document};
use once_cell::sync::Lazy;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

static API_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://api.notion.com/v1/").expect("static url"));

const API_VERSION_HEADER: &str = "Notion-Version";
const API_VERSION: &str = "2022-06-28";

/// Minimum spacing between outbound calls, roughly three per second.
const MIN_CALL_SPACING: Duration = Duration::from_millis(350);
const MAX_ATTEMPTS: u32 = 3;

/// Delay the server asked for, from the integer-seconds form of the
/// Retry-After header. The HTTP-date form is rare enough on this API to
/// fall through to the exponential fallback.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Document-service client. All calls go through a shared pacer that
/// enforces the inter-call spacing; rate-limit and server-error responses
/// are retried with the server-supplied delay up to the attempt ceiling,
/// after which the error surfaces to the caller.
pub struct DocServiceClient {
    http: reqwest::Client,
    token: SecretString,
    next_slot: Mutex<Instant>,
}

#[derive(Deserialize)]
struct QueryPage {
    results: Vec<Document>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

impl DocServiceClient {
    pub fn new(token: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build document-service HTTP client")?;

        Ok(Self {
            http,
            token,
            next_slot: Mutex::new(Instant::now()),
        })
    }

    async fn acquire_slot(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + MIN_CALL_SPACING;
            slot
        };

        tokio::time::sleep_until(slot).await;
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = API_BASE
            .join(path)
            .with_context(|| format!("invalid destination path {path}"))?;

        Ok(self
            .http
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
            .header(API_VERSION_HEADER, API_VERSION))
    }

    async fn send_with_retry(
        &self,
        build: impl Fn() -> Result<reqwest::RequestBuilder> + Send + Sync,
    ) -> Result<reqwest::Response> {
        for attempt in 0..MAX_ATTEMPTS {
            self.acquire_slot().await;

            match build()?.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        if attempt + 1 == MAX_ATTEMPTS {
                            bail!("destination returned {status} after {MAX_ATTEMPTS} attempts");
                        }
                        let delay = retry_after(&response)
                            .unwrap_or_else(|| Duration::from_secs(1 << attempt));
                        debug!(%status, ?delay, "destination busy, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Ok(response.error_for_status()?);
                }
                Err(error) => {
                    if attempt + 1 == MAX_ATTEMPTS {
                        return Err(error.into());
                    }
                    tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                }
            }
        }

        bail!("retry ceiling reached")
    }

    /// Drains a cursor-paginated collection listing.
    async fn query_all(&self, collection_id: &str) -> Result<Vec<Document>> {
        let path = format!("databases/{collection_id}/query");
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = match &cursor {
                Some(cursor) => json!({ "start_cursor": cursor }),
                None => json!({}),
            };
            let response = self
                .send_with_retry(|| {
                    Ok(self.request(reqwest::Method::POST, &path)?.json(&body))
                })
                .await?;
            let page: QueryPage = response.json().await?;

            documents.extend(page.results);

            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn create_page(
        &self,
        collection_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Document> {
        let body = json!({
            "parent": { "database_id": collection_id },
            "properties": properties,
        });
        let response = self
            .send_with_retry(|| Ok(self.request(reqwest::Method::POST, "pages")?.json(&body)))
            .await?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DestinationApi for DocServiceClient {
    async fn list_course_documents(&self, collection_id: &str) -> Result<Vec<Document>> {
        self.query_all(collection_id).await
    }

    async fn create_course_document(
        &self,
        collection_id: &str,
        name: &str,
        identity_key: &str,
    ) -> Result<Document> {
        self.create_page(collection_id, schema::course_properties(name, identity_key))
            .await
    }

    async fn list_assignment_documents(&self, collection_id: &str) -> Result<Vec<Document>> {
        self.query_all(collection_id).await
    }

    async fn create_assignment_document(
        &self,
        collection_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Document> {
        self.create_page(collection_id, properties).await
    }

    async fn update_assignment_document(
        &self,
        document_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Document> {
        let path = format!("pages/{document_id}");
        let body = json!({ "properties": properties });
        let response = self
            .send_with_retry(|| Ok(self.request(reqwest::Method::PATCH, &path)?.json(&body)))
            .await?;

        Ok(response.json().await?)
    }
}
