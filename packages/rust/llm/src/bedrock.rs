//! Amazon Bedrock via the Runtime Converse REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docground_shared::{BedrockConfig, GenerationConfig, Result, read_secret};

use crate::LanguageModel;
use crate::http::{build_client, endpoint, require_text, send_json};

const LABEL: &str = "Bedrock";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: Vec<ConverseMessage<'a>>,
    inference_config: InferenceConfig,
}

#[derive(Debug, Serialize)]
struct ConverseMessage<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ConverseResponse {
    output: Option<ConverseOutput>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: Option<OutputMessage>,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<OutputBlock>,
}

#[derive(Debug, Deserialize)]
struct OutputBlock {
    text: Option<String>,
}

impl ConverseResponse {
    /// First non-blank text block of the assistant message.
    fn first_text(self) -> Option<String> {
        self.output?
            .message?
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .find(|text| !text.trim().is_empty())
    }
}

/// Bedrock Converse provider authenticated with a bearer API key.
pub struct BedrockProvider {
    client: Client,
    config: BedrockConfig,
    generation: GenerationConfig,
    api_key: Option<String>,
}

impl BedrockProvider {
    pub fn new(config: BedrockConfig, generation: GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(generation.timeout_secs)?,
            config,
            generation,
            api_key: None,
        })
    }

    /// Use this key instead of reading `api_key_env` on every call.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn api_key(&self) -> Result<String> {
        match &self.api_key {
            Some(key) => Ok(key.clone()),
            None => read_secret(&self.config.api_key_env),
        }
    }
}

#[async_trait]
impl LanguageModel for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    #[instrument(skip_all, fields(model = %self.config.model_id, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let url = endpoint(
            LABEL,
            &self.config.endpoint(),
            &["model", self.config.model_id.as_str(), "converse"],
        )?;

        let body = ConverseRequest {
            messages: vec![ConverseMessage {
                role: "user",
                content: vec![TextBlock { text: prompt }],
            }],
            inference_config: InferenceConfig {
                max_tokens: self.generation.max_tokens,
                temperature: self.generation.temperature,
            },
        };

        let response: ConverseResponse =
            send_json(LABEL, self.client.post(url).bearer_auth(api_key).json(&body)).await?;

        let text = require_text(LABEL, response.first_text())?;
        debug!(answer_chars = text.len(), "bedrock answer received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use docground_shared::DocgroundError;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> BedrockProvider {
        let config = BedrockConfig {
            model_id: "test-model".into(),
            endpoint: Some(server.uri()),
            ..Default::default()
        };
        BedrockProvider::new(config, GenerationConfig::default())
            .unwrap()
            .with_api_key("bedrock-key")
    }

    #[tokio::test]
    async fn returns_first_non_blank_text_block() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/model/test-model/converse"))
            .and(header("authorization", "Bearer bedrock-key"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{ "role": "user", "content": [{ "text": "hello" }] }],
                "inferenceConfig": { "maxTokens": 2048 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": { "message": { "role": "assistant", "content": [
                    { "text": "  " },
                    { "text": "## Summary\nAll good." }
                ]}},
                "stopReason": "end_turn"
            })))
            .mount(&server)
            .await;

        let answer = provider_for(&server).generate("hello").await.unwrap();
        assert_eq!(answer, "## Summary\nAll good.");
    }

    #[tokio::test]
    async fn empty_output_is_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": { "message": { "content": [] } }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hello").await.unwrap_err();
        assert!(matches!(err, DocgroundError::Model(_)));
        assert!(err.to_string().contains("no text output"));
    }

    #[tokio::test]
    async fn non_success_status_is_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hello").await.unwrap_err();
        assert!(err.is_collaborator_failure());
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn missing_key_is_config_error() {
        let config = BedrockConfig {
            api_key_env: "DG_TEST_BEDROCK_KEY_UNSET_98765".into(),
            ..Default::default()
        };
        let provider = BedrockProvider::new(config, GenerationConfig::default()).unwrap();

        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, DocgroundError::Config { .. }));
        assert!(err.to_string().contains("DG_TEST_BEDROCK_KEY_UNSET_98765"));
    }
}
