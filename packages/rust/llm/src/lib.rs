//! Language-model providers for docground.
//!
//! This crate provides:
//! - [`LanguageModel`]: the prompt-in, text-out seam the orchestrator calls
//! - [`BedrockProvider`], [`GeminiProvider`], [`GitLabDuoProvider`]: REST implementations
//! - [`ProviderRegistry`]: lookup from [`ProviderKind`](docground_shared::ProviderKind) to a provider

pub mod bedrock;
pub mod gemini;
pub mod gitlab_duo;
mod http;
pub mod registry;

use async_trait::async_trait;

use docground_shared::Result;

pub use bedrock::BedrockProvider;
pub use gemini::GeminiProvider;
pub use gitlab_duo::GitLabDuoProvider;
pub use registry::ProviderRegistry;

/// A text-generation backend.
///
/// A call either returns non-blank answer text or fails; there are no
/// retries at this layer.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Stable identifier reported back to callers (`bedrock`, `gemini`, ...).
    fn name(&self) -> &str;

    /// Generate an answer for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
