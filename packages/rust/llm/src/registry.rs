//! Provider lookup by [`ProviderKind`].

use std::collections::HashMap;
use std::sync::Arc;

use docground_shared::{AppConfig, DocgroundError, ProviderKind, Result};

use crate::{BedrockProvider, GeminiProvider, GitLabDuoProvider, LanguageModel};

/// Registered language models, one per provider kind.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn LanguageModel>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the model used for `kind`.
    pub fn with(mut self, kind: ProviderKind, model: Arc<dyn LanguageModel>) -> Self {
        self.providers.insert(kind, model);
        self
    }

    /// Register all built-in providers from config.
    ///
    /// Secrets are not read here; a provider whose key is missing fails
    /// only when it is actually called.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generation = &config.generation;
        Ok(Self::new()
            .with(
                ProviderKind::Bedrock,
                Arc::new(BedrockProvider::new(config.bedrock.clone(), generation.clone())?),
            )
            .with(
                ProviderKind::Gemini,
                Arc::new(GeminiProvider::new(config.gemini.clone(), generation.clone())?),
            )
            .with(
                ProviderKind::GitlabDuo,
                Arc::new(GitLabDuoProvider::new(
                    config.gitlab_duo.clone(),
                    generation.clone(),
                )?),
            ))
    }

    /// Look up the model for `kind`.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn LanguageModel>> {
        self.providers.get(&kind).cloned().ok_or_else(|| {
            DocgroundError::validation(format!("provider '{kind}' is not available"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl LanguageModel for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn from_config_registers_every_kind() {
        let registry = ProviderRegistry::from_config(&AppConfig::default()).unwrap();
        for kind in ProviderKind::ALL {
            let model = registry.get(kind).unwrap();
            assert_eq!(model.name(), kind.as_str());
        }
    }

    #[test]
    fn unregistered_kind_is_validation_error() {
        let registry = ProviderRegistry::new().with(ProviderKind::Gemini, Arc::new(Echo));
        assert!(registry.get(ProviderKind::Gemini).is_ok());

        let err = registry.get(ProviderKind::Bedrock).err().unwrap();
        assert!(err.is_validation());
        assert!(err.to_string().contains("bedrock"));
    }

    #[tokio::test]
    async fn registered_model_is_callable() {
        let registry = ProviderRegistry::new().with(ProviderKind::Gemini, Arc::new(Echo));
        let answer = registry
            .get(ProviderKind::Gemini)
            .unwrap()
            .generate("ping")
            .await
            .unwrap();
        assert_eq!(answer, "ping");
    }
}
