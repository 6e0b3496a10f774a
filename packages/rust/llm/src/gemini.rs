//! Google Gemini `generateContent` provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docground_shared::{GeminiConfig, GenerationConfig, Result, read_secret};

use crate::LanguageModel;
use crate::http::{build_client, endpoint, require_text, send_json};

const LABEL: &str = "Gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: SamplingConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplingConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini provider keyed by an API key sent in the `x-goog-api-key` header.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    generation: GenerationConfig,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, generation: GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(generation.timeout_secs)?,
            config,
            generation,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl LanguageModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => read_secret(&self.config.api_key_env)?,
        };
        let method = format!("{}:generateContent", self.config.model);
        let url = endpoint(LABEL, &self.config.base_url, &["v1beta", "models", method.as_str()])?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: SamplingConfig {
                temperature: self.generation.temperature,
                max_output_tokens: self.generation.max_tokens,
            },
        };

        let response: GenerateResponse = send_json(
            LABEL,
            self.client
                .post(url)
                .header(API_KEY_HEADER, api_key)
                .json(&body),
        )
        .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        let text = require_text(LABEL, text)?;
        debug!(answer_chars = text.len(), "gemini answer received");
        Ok(text)
    }
}
