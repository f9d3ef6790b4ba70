//! Query engine: embed, retrieve and answer

use std::sync::Arc;
use std::time::Instant;

use super::manager::IndexManager;
use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::types::SearchHit;

/// Answers questions over the managed index
pub struct QueryEngine {
    index: IndexManager,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    similarity_top_k: usize,
}

impl QueryEngine {
    pub fn new(
        index: IndexManager,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        similarity_top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            similarity_top_k,
        }
    }

    /// Create from configuration, sharing `embedder` between indexing and queries
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let index = IndexManager::from_config(config, Arc::clone(&embedder));
        Self::new(index, embedder, llm, config.retrieval.similarity_top_k)
    }

    /// Index lifecycle handle
    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    /// Whether the completion provider is reachable
    pub async fn health_check(&self) -> Result<bool> {
        self.llm.health_check().await
    }

    /// Chunks most similar to `query`, best first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>> {
        let index = self.index.get().await?;
        let query_vector = self.embedder.embed(query).await?;
        index.search(&query_vector, self.similarity_top_k)
    }

    /// Answer `query` from the retrieved chunks
    pub async fn query(&self, query: &str) -> Result<String> {
        let start = Instant::now();

        let hits = self.retrieve(query).await?;
        tracing::debug!(
            "Retrieved {} chunks: {:?}",
            hits.len(),
            hits.iter()
                .map(|h| (h.chunk.file_name().unwrap_or("?"), h.similarity))
                .collect::<Vec<_>>()
        );

        let prompt = PromptBuilder::build(query, &hits);
        let answer = self.llm.complete(&prompt).await?;

        tracing::info!(
            "Answered query in {:?} using {} ({})",
            start.elapsed(),
            self.llm.model(),
            self.llm.name()
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ingestion::{DirectoryLoader, TextChunker};
    use crate::providers::mock::{MockEmbedder, MockLlm};
    use crate::retrieval::IndexStore;
    use crate::testing::write_files;
    use tempfile::TempDir;

    fn engine(tmp: &TempDir, embedder: MockEmbedder, llm: MockLlm) -> QueryEngine {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
        let manager = IndexManager::new(
            DirectoryLoader::new(tmp.path().join("data")),
            TextChunker::new(2048, 200),
            IndexStore::new(tmp.path().join("storage")),
            Arc::clone(&embedder),
            64,
        );
        QueryEngine::new(manager, embedder, Arc::new(llm), 2)
    }

    fn with_docs(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        write_files(&data, files);
        tmp
    }

    #[tokio::test]
    async fn test_retrieve_picks_relevant_documents() {
        let tmp = with_docs(&[
            ("bread.txt", "Sourdough bread needs flour, water and a starter."),
            ("rust.txt", "The borrow checker enforces ownership in Rust."),
            ("tea.txt", "Green tea is steeped at low temperature."),
        ]);
        let engine = engine(&tmp, MockEmbedder::default(), MockLlm::echo());

        let hits = engine.retrieve("how does the borrow checker work").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.file_name(), Some("rust.txt"));
    }

    #[tokio::test]
    async fn test_query_prompt_contains_context_and_query() {
        let tmp = with_docs(&[("rust.txt", "The borrow checker enforces ownership.")]);
        let engine = engine(&tmp, MockEmbedder::default(), MockLlm::echo());

        let answer = engine.query("What enforces ownership?").await.unwrap();

        assert!(answer.starts_with("Context information is below."));
        assert!(answer.contains("file_name: rust.txt"));
        assert!(answer.contains("The borrow checker enforces ownership."));
        assert!(answer.ends_with("Query: What enforces ownership?\nAnswer: "));
    }

    #[tokio::test]
    async fn test_repeat_queries_are_identical() {
        let tmp = with_docs(&[
            ("a.txt", "Alpha notes about tokio."),
            ("b.txt", "Beta notes about axum."),
        ]);
        let engine = engine(&tmp, MockEmbedder::default(), MockLlm::echo());

        let first = engine.query("axum").await.unwrap();
        let second = engine.query("axum").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_cold_start_builds_once() {
        let tmp = with_docs(&[("a.txt", "Shared content.")]);
        let embedder = MockEmbedder::default();
        let llm = MockLlm::with_response("ok");
        let engine = engine(&tmp, embedder.clone(), llm.clone());

        let (a, b, c) = tokio::join!(engine.query("one"), engine.query("two"), engine.query("three"));
        for answer in [a, b, c] {
            assert_eq!(answer.unwrap(), "ok");
        }

        assert_eq!(embedder.batch_calls(), 1);
        assert_eq!(embedder.embed_calls(), 3);
        assert_eq!(llm.calls(), 3);
        assert!(tmp.path().join("storage/docstore.json").is_file());
    }

    #[tokio::test]
    async fn test_removed_document_gone_after_rebuild() {
        let tmp = with_docs(&[
            ("keep.txt", "Lighthouses guide ships."),
            ("gone.txt", "Volcanoes erupt lava."),
        ]);
        let engine = engine(&tmp, MockEmbedder::default(), MockLlm::echo());
        assert!(engine.query("volcanoes").await.unwrap().contains("gone.txt"));

        std::fs::remove_file(tmp.path().join("data/gone.txt")).unwrap();
        engine.index().rebuild().await.unwrap();

        let answer = engine.query("volcanoes").await.unwrap();
        assert!(!answer.contains("gone.txt"));
        assert!(!answer.contains("Volcanoes erupt lava."));
    }

    #[tokio::test]
    async fn test_llm_failure_is_upstream() {
        let tmp = with_docs(&[("a.txt", "content")]);
        let engine = engine(&tmp, MockEmbedder::default(), MockLlm::failing());

        assert!(matches!(engine.query("q").await, Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn test_health_check_reports_provider_state() {
        let tmp = with_docs(&[]);
        assert!(engine(&tmp, MockEmbedder::default(), MockLlm::echo())
            .health_check()
            .await
            .unwrap());
        assert!(!engine(&tmp, MockEmbedder::default(), MockLlm::failing())
            .health_check()
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_no_documents_is_config_error() {
        let tmp = with_docs(&[]);
        let llm = MockLlm::echo();
        let engine = engine(&tmp, MockEmbedder::default(), llm.clone());

        assert!(engine.query("hello").await.unwrap_err().is_config());
        assert_eq!(llm.calls(), 0);
    }
}
