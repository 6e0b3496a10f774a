//! End-to-end query flow: roots → extraction → prompt → model → sources.
//!
//! All request validation happens before the first collaborator call, so an
//! invalid request never touches the document store or a model.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use docground_extractor::{ConfluenceClient, DocumentSource, ExtractProgress, TreeExtractor};
use docground_llm::ProviderRegistry;
use docground_shared::{
    AppConfig, DefaultsConfig, DocgroundError, DocumentRecord, ProviderKind, Result,
    TraversalLimits, read_secret,
};

use crate::locator::parse_page_id;
use crate::prompt::build_prompt;
use crate::sources::resolve_sources;

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// Inbound request for both the full query and extraction-only flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    /// The user question. Required for a full query only.
    pub query: Option<String>,
    pub provider: Option<String>,
    pub root_page_url: Option<String>,
    /// Takes precedence over `root_page_url` when it holds any non-blank entry.
    pub root_page_urls: Option<Vec<String>>,
    pub max_depth: Option<i64>,
    pub max_pages: Option<i64>,
}

/// Result of a full query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub status: &'static str,
    pub provider: String,
    pub root_page_url: String,
    pub root_page_urls: Vec<String>,
    pub retrieved_page_count: usize,
    pub sources: Vec<DocumentRecord>,
    pub answer: String,
}

/// Result of an extraction-only request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub root_page_url: String,
    pub root_page_urls: Vec<String>,
    pub retrieved_page_count: usize,
    pub pages: Vec<DocumentRecord>,
}

/// Values applied when a request leaves a field out.
#[derive(Debug, Clone, Default)]
pub struct QueryDefaults {
    pub root_page_url: Option<String>,
    pub limits: TraversalLimits,
    pub provider: ProviderKind,
}

impl QueryDefaults {
    pub fn from_config(defaults: &DefaultsConfig) -> Self {
        Self {
            root_page_url: defaults
                .root_page_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            limits: defaults.limits(),
            provider: defaults.provider,
        }
    }
}

/// Roots and quotas of a request that passed validation.
struct ResolvedRequest {
    root_urls: Vec<String>,
    root_ids: Vec<String>,
    limits: TraversalLimits,
}

impl ResolvedRequest {
    fn primary_root(&self) -> String {
        self.root_urls.first().cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs queries against a document source and a set of language models.
#[derive(Clone)]
pub struct Orchestrator {
    extractor: TreeExtractor,
    registry: ProviderRegistry,
    defaults: QueryDefaults,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        registry: ProviderRegistry,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            extractor: TreeExtractor::new(source),
            registry,
            defaults,
        }
    }

    /// Wire the Confluence client and every built-in provider from config.
    ///
    /// Fails when the Confluence base URL or API token is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let token = read_secret(&config.confluence.api_token_env)?;
        let client = ConfluenceClient::new(&config.confluence, token)?;
        let registry = ProviderRegistry::from_config(config)?;

        Ok(Self::new(
            Arc::new(client),
            registry,
            QueryDefaults::from_config(&config.defaults),
        ))
    }

    /// Answer a question grounded in the requested page trees.
    #[instrument(skip_all, fields(provider = request.provider.as_deref().unwrap_or_default()))]
    pub async fn query(
        &self,
        request: &QueryRequest,
        progress: &dyn ExtractProgress,
    ) -> Result<QueryResponse> {
        let start = Instant::now();

        let question = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| DocgroundError::validation("query is required"))?;
        let kind = ProviderKind::parse_or(request.provider.as_deref(), self.defaults.provider)?;
        let model = self.registry.get(kind)?;
        let resolved = self.resolve(request)?;

        info!(
            provider = %kind,
            roots = resolved.root_ids.len(),
            max_depth = resolved.limits.max_depth,
            max_pages = resolved.limits.max_pages,
            "starting query"
        );

        let records = self
            .extractor
            .extract_many(&resolved.root_ids, resolved.limits, progress)
            .await?;

        let prompt = build_prompt(question, &resolved.root_urls.join(", "), &records);
        let answer = model.generate(&prompt).await?;
        let sources = resolve_sources(&answer, &records);

        info!(
            pages = records.len(),
            sources = sources.len(),
            prompt_chars = prompt.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "query complete"
        );

        Ok(QueryResponse {
            status: "ok",
            provider: model.name().to_string(),
            root_page_url: resolved.primary_root(),
            retrieved_page_count: records.len(),
            root_page_urls: resolved.root_urls,
            sources,
            answer,
        })
    }

    /// Retrieve the requested page trees without calling a model.
    #[instrument(skip_all)]
    pub async fn extract_only(
        &self,
        request: &QueryRequest,
        progress: &dyn ExtractProgress,
    ) -> Result<ExtractResponse> {
        let start = Instant::now();

        // Not used here, but a malformed identifier is still rejected.
        ProviderKind::parse_or(request.provider.as_deref(), self.defaults.provider)?;
        let resolved = self.resolve(request)?;

        let pages = self
            .extractor
            .extract_many(&resolved.root_ids, resolved.limits, progress)
            .await?;

        info!(
            pages = pages.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "extraction complete"
        );

        Ok(ExtractResponse {
            status: "ok",
            mode: "extract-only",
            root_page_url: resolved.primary_root(),
            retrieved_page_count: pages.len(),
            root_page_urls: resolved.root_urls,
            pages,
        })
    }

    /// Pick the roots, parse each to a page id, and settle the quotas.
    fn resolve(&self, request: &QueryRequest) -> Result<ResolvedRequest> {
        let root_urls = self.root_urls(request);
        if root_urls.is_empty() {
            return Err(DocgroundError::validation(
                "rootPageUrl is required (no default root page is configured)",
            ));
        }

        let root_ids = root_urls
            .iter()
            .map(|url| parse_page_id(url))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedRequest {
            root_urls,
            root_ids,
            limits: TraversalLimits::resolve(
                request.max_depth,
                request.max_pages,
                self.defaults.limits,
            ),
        })
    }

    fn root_urls(&self, request: &QueryRequest) -> Vec<String> {
        let non_blank = |url: &String| {
            let trimmed = url.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let many: Vec<String> = request
            .root_page_urls
            .iter()
            .flatten()
            .filter_map(non_blank)
            .collect();
        if !many.is_empty() {
            return many;
        }

        request
            .root_page_url
            .as_ref()
            .and_then(non_blank)
            .or_else(|| self.defaults.root_page_url.clone())
            .into_iter()
            .collect()
    }
}
