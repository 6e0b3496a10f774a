//! GitLab Duo chat-completions provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docground_shared::{GenerationConfig, GitLabDuoConfig, Result, read_secret};

use crate::LanguageModel;
use crate::http::{build_client, endpoint, require_text, send_json};

const LABEL: &str = "GitLab Duo";

const SYSTEM_PROMPT: &str = "You are an expert technical analyst.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct GitLabDuoProvider {
    client: Client,
    config: GitLabDuoConfig,
    generation: GenerationConfig,
    token: Option<String>,
}

impl GitLabDuoProvider {
    pub fn new(config: GitLabDuoConfig, generation: GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(generation.timeout_secs)?,
            config,
            generation,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl LanguageModel for GitLabDuoProvider {
    fn name(&self) -> &str {
        "gitlab_duo"
    }

    #[instrument(skip_all, fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => read_secret(&self.config.token_env)?,
        };
        let url = endpoint(
            LABEL,
            &self.config.base_url,
            &["api", "v4", "chat", "completions"],
        )?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            stream: false,
        };

        let response: ChatResponse =
            send_json(LABEL, self.client.post(url).bearer_auth(token).json(&body)).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        let text = require_text(LABEL, text)?;
        debug!(answer_chars = text.len(), "gitlab duo answer received");
        Ok(text)
    }
}
