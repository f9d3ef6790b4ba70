//! Deterministic in-process providers for tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Hashed bag-of-words embedder
///
/// Each lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets; the resulting count vector is L2-normalized. Texts sharing words
/// therefore score a positive cosine similarity.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimensions: usize,
    pub fail: bool,
    embed_calls: Arc<AtomicUsize>,
    batch_calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimensions: 256,
            fail: false,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            batch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of single-text `embed` calls
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed_batch` calls
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions.max(1)];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % vector.len() as u64) as usize;
            vector[idx] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::upstream("mock embedding error"));
        }
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::upstream("mock embedding error"));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}

/// Completion provider that answers with a fixed string or echoes the prompt
#[derive(Debug, Clone, Default)]
pub struct MockLlm {
    /// Fixed answer; `None` echoes the prompt
    pub response: Option<String>,
    pub fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockLlm {
    #[must_use]
    pub fn echo() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `complete` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::upstream("mock LLM error"));
        }
        Ok(self.response.clone().unwrap_or_else(|| prompt.to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-llm"
    }
}
