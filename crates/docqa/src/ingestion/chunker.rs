//! Fixed-size text chunking with overlap

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap, in characters
///
/// Window boundaries depend only on the text length: every window holds
/// `chunk_size` characters and starts `chunk_size - overlap` characters after
/// the previous one.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Overlap between consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    ///
    /// `overlap` is clamped below `chunk_size` so the window always advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create from the token-based chunking configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_chars(), config.overlap_chars())
    }

    /// Distance between consecutive window starts
    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Chunk a single document
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.windows(&doc.text)
            .into_iter()
            .filter(|(_, _, text)| !text.trim().is_empty())
            .enumerate()
            .map(|(i, (start, end, text))| Chunk::new(doc, text, i as u32, start, end))
            .collect()
    }

    /// Chunk a sequence of documents, preserving document order
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    /// Split text into `(char_start, char_end, text)` windows
    fn windows(&self, text: &str) -> Vec<(usize, usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut windows = Vec::new();
        let mut start = 0usize;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            windows.push((start, end, chars[start..end].iter().collect()));
            if end == total {
                break;
            }
            start += self.step();
        }

        windows
    }
}
