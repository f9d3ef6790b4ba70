//! Index lifecycle: load on first use, build when missing, rebuild on demand

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::index::VectorIndex;
use super::storage::{IndexState, IndexStore};
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{DirectoryLoader, TextChunker};
use crate::providers::EmbeddingProvider;

/// Owns the in-memory index and the directory it is persisted to
pub struct IndexManager {
    loader: DirectoryLoader,
    chunker: TextChunker,
    store: IndexStore,
    embedder: Arc<dyn EmbeddingProvider>,
    embed_batch_size: usize,
    current: RwLock<Option<Arc<VectorIndex>>>,
    /// Held for the duration of any load or build
    build_lock: Mutex<()>,
}

impl IndexManager {
    pub fn new(
        loader: DirectoryLoader,
        chunker: TextChunker,
        store: IndexStore,
        embedder: Arc<dyn EmbeddingProvider>,
        embed_batch_size: usize,
    ) -> Self {
        Self {
            loader,
            chunker,
            store,
            embedder,
            embed_batch_size: embed_batch_size.max(1),
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            DirectoryLoader::from_config(&config.ingestion),
            TextChunker::from_config(&config.chunking),
            IndexStore::new(&config.storage.storage_dir),
            embedder,
            config.llm.embed_batch_size,
        )
    }

    /// Persistence layer
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Current index, loading or building it on first use
    pub async fn get(&self) -> Result<Arc<VectorIndex>> {
        let cached = self.current.read().clone();
        if let Some(index) = cached {
            return Ok(index);
        }

        let _guard = self.build_lock.lock().await;

        // Another task may have finished while we waited
        let cached = self.current.read().clone();
        if let Some(index) = cached {
            return Ok(index);
        }

        let index = match self.store.state() {
            IndexState::Absent => {
                tracing::info!(
                    "No index found at {}, building from {}",
                    self.store.storage_dir().display(),
                    self.loader.data_dir().display()
                );
                self.build_and_persist().await?
            }
            IndexState::Present => self.load().await?,
        };

        *self.current.write() = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Build a fresh index from the document directory, replacing the stored one
    pub async fn rebuild(&self) -> Result<Arc<VectorIndex>> {
        let _guard = self.build_lock.lock().await;
        tracing::info!("Rebuilding index from {}", self.loader.data_dir().display());

        let index = self.build_and_persist().await?;
        *self.current.write() = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Load, chunk and embed every document without persisting
    pub async fn build(&self) -> Result<VectorIndex> {
        let start = Instant::now();

        let loader = self.loader.clone();
        let documents = tokio::task::spawn_blocking(move || loader.load()).await??;

        let chunks = self.chunker.chunk_documents(&documents);
        if chunks.is_empty() {
            return Err(Error::config(format!(
                "Documents in '{}' contain no text",
                self.loader.data_dir().display()
            )));
        }

        tracing::info!(
            "Embedding {} chunks from {} documents with {} ({})",
            chunks.len(),
            documents.len(),
            self.embedder.model(),
            self.embedder.name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            vectors.extend(self.embedder.embed_batch(batch).await?);
        }

        if vectors.len() != chunks.len() {
            return Err(Error::upstream(format!(
                "Embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let index = VectorIndex::new(chunks, vectors, self.embedder.model(), documents.len())?;

        tracing::info!(
            "Built index: {} documents, {} chunks in {:?}",
            documents.len(),
            index.len(),
            start.elapsed()
        );

        Ok(index)
    }

    async fn build_and_persist(&self) -> Result<Arc<VectorIndex>> {
        let index = Arc::new(self.build().await?);

        let store = self.store.clone();
        let to_write = Arc::clone(&index);
        tokio::task::spawn_blocking(move || store.persist(&to_write)).await??;

        tracing::info!("Index persisted to {}", self.store.storage_dir().display());
        Ok(index)
    }

    async fn load(&self) -> Result<Arc<VectorIndex>> {
        let store = self.store.clone();
        let index = tokio::task::spawn_blocking(move || store.load()).await??;

        tracing::info!(
            "Loaded index from {}: {} chunks",
            self.store.storage_dir().display(),
            index.len()
        );
        Ok(Arc::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockEmbedder;
    use crate::testing::write_files;
    use tempfile::TempDir;

    fn manager(tmp: &TempDir, embedder: MockEmbedder) -> IndexManager {
        IndexManager::new(
            DirectoryLoader::new(tmp.path().join("data")),
            TextChunker::new(200, 20),
            IndexStore::new(tmp.path().join("storage")),
            Arc::new(embedder),
            64,
        )
    }

    fn data_dir(tmp: &TempDir) -> std::path::PathBuf {
        let dir = tmp.path().join("data");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_cold_start_builds_once_and_persists() {
        let tmp = TempDir::new().unwrap();
        write_files(&data_dir(&tmp), &[("a.txt", "Tokio is an async runtime.")]);
        let embedder = MockEmbedder::default();
        let manager = manager(&tmp, embedder.clone());

        let (first, second) = tokio::join!(manager.get(), manager.get());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(embedder.batch_calls(), 1);
        assert!(tmp.path().join("storage").join("docstore.json").is_file());

        // Cached afterwards
        manager.get().await.unwrap();
        assert_eq!(embedder.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_present_index_is_loaded_not_rebuilt() {
        let tmp = TempDir::new().unwrap();
        write_files(&data_dir(&tmp), &[("a.txt", "Persisted content.")]);
        manager(&tmp, MockEmbedder::default()).get().await.unwrap();

        let embedder = MockEmbedder::default();
        let index = manager(&tmp, embedder.clone()).get().await.unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(embedder.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let data = data_dir(&tmp);
        write_files(&data, &[("keep.txt", "kept text"), ("drop.txt", "dropped text")]);
        let manager = manager(&tmp, MockEmbedder::default());
        assert_eq!(manager.get().await.unwrap().manifest().document_count, 2);

        std::fs::remove_file(data.join("drop.txt")).unwrap();
        let index = manager.rebuild().await.unwrap();

        assert_eq!(index.manifest().document_count, 1);
        assert!(index.chunks().iter().all(|c| c.file_name() == Some("keep.txt")));
        assert!(Arc::ptr_eq(&index, &manager.get().await.unwrap()));
        assert_eq!(manager.store().load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_is_config_error() {
        let tmp = TempDir::new().unwrap();
        data_dir(&tmp);
        let manager = manager(&tmp, MockEmbedder::default());

        let err = manager.get().await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(manager.store().state(), IndexState::Absent);
    }

    #[tokio::test]
    async fn test_documents_without_text_is_config_error() {
        let tmp = TempDir::new().unwrap();
        write_files(&data_dir(&tmp), &[("blank.txt", "   \n\n  ")]);

        let err = manager(&tmp, MockEmbedder::default()).build().await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_embedding_batches() {
        let tmp = TempDir::new().unwrap();
        let text = "word ".repeat(200);
        write_files(&data_dir(&tmp), &[("long.txt", text.as_str())]);
        let embedder = MockEmbedder::default();
        let manager = IndexManager::new(
            DirectoryLoader::new(tmp.path().join("data")),
            TextChunker::new(100, 0),
            IndexStore::new(tmp.path().join("storage")),
            Arc::new(embedder.clone()),
            3,
        );

        let index = manager.build().await.unwrap();

        assert_eq!(index.len(), 10);
        assert_eq!(embedder.batch_calls(), 4);
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_no_index() {
        let tmp = TempDir::new().unwrap();
        write_files(&data_dir(&tmp), &[("a.txt", "text")]);
        let manager = manager(&tmp, MockEmbedder::failing());

        assert!(matches!(manager.get().await, Err(Error::Upstream(_))));
        assert_eq!(manager.store().state(), IndexState::Absent);
    }
}
