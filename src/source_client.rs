use anyhow::{Context, Result};
use async_trait::async_trait;
use coursework_sync::raw_data::RawCourseData;
use coursework_sync::source::{ListPage, SourceApi};
use coursework_sync::CourseData;
use reqwest::header::LINK;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

/// LMS REST client. Pagination is link-header driven; each page reports
/// whether the server offered a continuation.
pub struct LmsClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
}

impl LmsClient {
    pub fn new(base: Url, token: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build LMS HTTP client")?;

        Ok(Self { http, base, token })
    }

    pub fn domain(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(&format!("api/v1/{path}"))
            .with_context(|| format!("invalid LMS path {path}"))
    }
}

fn has_next_link(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |links| {
            links.split(',').any(|link| link.contains("rel=\"next\""))
        })
}

#[async_trait]
impl SourceApi for LmsClient {
    async fn list_children(
        &self,
        _course_source_id: &str,
        path: &str,
        page: u32,
    ) -> Result<ListPage> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .query(&[("page", page.to_string()), ("per_page", "100".to_owned())])
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?
            .error_for_status()?;

        let has_more = has_next_link(&response);
        let body = response.json::<Value>().await?;

        Ok(ListPage { body, has_more })
    }

    async fn list_courses(&self) -> Result<Vec<CourseData>> {
        let mut courses = Vec::new();

        for page in 1..=coursework_sync::source::MAX_LIST_PAGES {
            let response = self
                .http
                .get(self.endpoint("courses")?)
                .query(&[
                    ("enrollment_state", "active".to_owned()),
                    ("page", page.to_string()),
                    ("per_page", "100".to_owned()),
                ])
                .bearer_auth(self.token.expose_secret())
                .send()
                .await?
                .error_for_status()?;

            let has_more = has_next_link(&response);
            let body = response.json::<Value>().await?;

            let Some(items) = body.as_array() else {
                break;
            };

            for item in items {
                // Restricted enrollments come back without a name; skip them.
                if let Ok(raw) = serde_json::from_value::<RawCourseData>(item.clone()) {
                    if raw.name.is_some() {
                        courses.push(CourseData::from(raw));
                    }
                }
            }

            if !has_more {
                break;
            }
        }

        Ok(courses)
    }
}
