//! Confluence REST client implementing [`DocumentSource`].
//!
//! Replies are decoded into typed structs right here, so the extractor only
//! ever sees [`PagePayload`] and [`ChildRef`] values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use docground_shared::{ChildRef, ConfluenceConfig, DocgroundError, PagePayload, Result};

use crate::source::DocumentSource;

/// User-Agent string for document-store requests.
const USER_AGENT: &str = concat!("docground/", env!("CARGO_PKG_VERSION"));

/// Title used when the store omits one.
const UNTITLED: &str = "Untitled";

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentResponse {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    body: Option<ContentBody>,
    #[serde(default, rename = "_links")]
    links: Option<ContentLinks>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    storage: Option<StorageValue>,
}

#[derive(Debug, Deserialize)]
struct StorageValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentLinks {
    webui: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    results: Vec<ChildResult>,
}

#[derive(Debug, Deserialize)]
struct ChildResult {
    id: Option<String>,
    title: Option<String>,
}

// ---------------------------------------------------------------------------
// ConfluenceClient
// ---------------------------------------------------------------------------

/// Authenticated client for the Confluence Cloud content API.
pub struct ConfluenceClient {
    client: Client,
    base_url: String,
    api_root: Url,
    email: String,
    api_token: String,
    page_size: usize,
}

impl ConfluenceClient {
    /// Create a client for the site in `config`, authenticating with `api_token`.
    pub fn new(config: &ConfluenceConfig, api_token: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        if base_url.is_empty() {
            return Err(DocgroundError::config(
                "confluence base_url is not configured (set CONFLUENCE_BASE_URL)",
            ));
        }
        let api_root = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                DocgroundError::config(format!("confluence base_url '{base_url}' is not a valid URL"))
            })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                DocgroundError::DocumentStore(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            api_root,
            email: config.email.clone(),
            api_token: api_token.into(),
            page_size: config.page_size.max(1),
        })
    }

    /// `{base}/wiki/rest/api/content/{id}` followed by `tail`, each segment percent-encoded.
    fn content_url(&self, id: &str, tail: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["wiki", "rest", "api", "content", id])
                .extend(tail);
        }
        url
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.email, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| DocgroundError::DocumentStore(format!("{url}: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocgroundError::DocumentStore(format!(
                "{url}: HTTP {status} - {}",
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                DocgroundError::DocumentStore(format!("{url}: invalid response body: {}", e.without_url()))
            })
    }
}

#[async_trait]
impl DocumentSource for ConfluenceClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, id: &str) -> Result<PagePayload> {
        let url = self.content_url(id, &[]);
        let content: ContentResponse = self
            .get_json(&url, &[("expand", "body.storage,version".to_string())])
            .await?;

        let webui = content
            .links
            .and_then(|l| l.webui)
            .unwrap_or_default();
        let source_url = if webui.trim().is_empty() {
            self.base_url.clone()
        } else {
            format!("{}{}", self.base_url, webui)
        };

        Ok(PagePayload {
            id: content.id.unwrap_or_else(|| id.to_string()),
            title: content.title.unwrap_or_else(|| UNTITLED.to_string()),
            body_html: content
                .body
                .and_then(|b| b.storage)
                .and_then(|s| s.value)
                .unwrap_or_default(),
            source_url,
        })
    }

    #[instrument(skip(self))]
    async fn fetch_children(&self, parent_id: &str) -> Result<Vec<ChildRef>> {
        let url = self.content_url(parent_id, &["child", "page"]);
        let mut children = Vec::new();
        let mut start = 0usize;

        loop {
            let page: ChildrenResponse = self
                .get_json(
                    &url,
                    &[
                        ("limit", self.page_size.to_string()),
                        ("start", start.to_string()),
                    ],
                )
                .await?;

            let batch_len = page.results.len();
            if batch_len == 0 {
                break;
            }

            children.extend(page.results.into_iter().filter_map(|child| {
                let id = child.id.filter(|id| !id.trim().is_empty())?;
                Some(ChildRef {
                    id,
                    title: child.title.unwrap_or_else(|| UNTITLED.to_string()),
                })
            }));

            if batch_len < self.page_size {
                break;
            }
            start += self.page_size;
        }

        debug!(parent_id, children = children.len(), "children listed");
        Ok(children)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trim whitespace, a trailing `/`, and a trailing `/wiki` from a base URL.
fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("/wiki").unwrap_or(trimmed);
    trimmed.to_string()
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
