//! Application state for the QA server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, LlmProvider, OpenAiClient};
use crate::retrieval::QueryEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Query engine owning the index
    engine: QueryEngine,
}

impl AppState {
    /// Create state backed by the OpenAI-compatible API
    pub fn new(config: RagConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(&config.llm)?);
        tracing::info!(
            "Language-model client initialized (embeddings: {}, generation: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        let embedder: Arc<dyn EmbeddingProvider> = client.clone();
        let llm: Arc<dyn LlmProvider> = client;
        Ok(Self::with_providers(config, embedder, llm))
    }

    /// Create state with explicit providers
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let engine = QueryEngine::from_config(&config, embedder, llm);
        Self {
            inner: Arc::new(AppStateInner { config, engine }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query engine
    pub fn engine(&self) -> &QueryEngine {
        &self.inner.engine
    }

    /// Whether the language-model API answers with the configured key
    pub async fn health_check(&self) -> Result<bool> {
        self.inner.engine.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockEmbedder, MockLlm};

    #[test]
    fn test_new_requires_api_key() {
        let err = AppState::new(RagConfig::default()).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_new_with_api_key() {
        let mut config = RagConfig::default();
        config.llm.api_key = Some("sk-test".to_string());

        let state = AppState::new(config).unwrap();
        assert_eq!(state.config().llm.generate_model, "gpt-4");
    }

    #[tokio::test]
    async fn test_health_check_uses_llm_provider() {
        let state = AppState::with_providers(
            RagConfig::default(),
            Arc::new(MockEmbedder::default()),
            Arc::new(MockLlm::failing()),
        );
        assert!(!state.health_check().await.unwrap());
    }
}
