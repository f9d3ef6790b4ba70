//! In-memory vector index with exact cosine-similarity search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, SearchHit};

/// Version of the persisted index layout
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Metadata describing a built index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Persisted layout version
    pub format_version: u32,
    /// Embedding model the vectors came from
    pub embed_model: String,
    /// Vector dimensions
    pub dimensions: usize,
    /// Documents the chunks were derived from
    pub document_count: usize,
    /// Number of chunks
    pub chunk_count: usize,
    /// Build time
    pub built_at: DateTime<Utc>,
}

/// Chunks with their embeddings, searchable by cosine similarity
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    /// L2 norm of each vector
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings (same order)
    pub fn new(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        embed_model: impl Into<String>,
        document_count: usize,
    ) -> Result<Self> {
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embed_model: embed_model.into(),
            dimensions: vectors.first().map_or(0, Vec::len),
            document_count,
            chunk_count: chunks.len(),
            built_at: Utc::now(),
        };
        Self::from_parts(manifest, chunks, vectors)
    }

    /// Reassemble an index, checking every vector against the manifest
    pub fn from_parts(
        manifest: IndexManifest,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::storage(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if manifest.chunk_count != chunks.len() {
            return Err(Error::storage(format!(
                "Manifest lists {} chunks, found {}",
                manifest.chunk_count,
                chunks.len()
            )));
        }
        if let Some(pos) = vectors.iter().position(|v| v.len() != manifest.dimensions) {
            return Err(Error::storage(format!(
                "Vector {} has {} dimensions, expected {}",
                pos,
                vectors[pos].len(),
                manifest.dimensions
            )));
        }

        let norms = vectors.iter().map(|v| l2_norm(v)).collect();

        Ok(Self {
            manifest,
            chunks,
            vectors,
            norms,
        })
    }

    /// Top `top_k` chunks by cosine similarity to `query`, best first
    ///
    /// Equal scores keep index order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.manifest.dimensions {
            return Err(Error::storage(format!(
                "Query vector has {} dimensions, index has {}",
                query.len(),
                self.manifest.dimensions
            )));
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (vector, norm))| (i, cosine(query, query_norm, vector, *norm)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| SearchHit {
                chunk: self.chunks[i].clone(),
                similarity,
            })
            .collect())
    }

    /// Index metadata
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Indexed chunks in build order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Embeddings, parallel to [`chunks`](Self::chunks)
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; non-finite results score -1.0 so they rank last
fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let similarity = dot / (a_norm * b_norm);
    if similarity.is_finite() {
        similarity
    } else {
        -1.0
    }
}
