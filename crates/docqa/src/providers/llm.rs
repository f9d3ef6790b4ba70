//! LLM provider trait for completing prompts

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt completion
///
/// Implementations:
/// - `OpenAiClient`: OpenAI-compatible `/chat/completions` endpoint
/// - `MockLlm`: echoes the prompt (tests)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt with the provider's fixed generation parameters
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
