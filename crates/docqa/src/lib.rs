//! docqa: question answering over a directory of documents
//!
//! Text and PDF files are loaded, split into overlapping chunks and embedded
//! into a vector index persisted on disk. Each query retrieves the most
//! similar chunks and asks a language model to answer from them. The whole
//! pipeline is served as `GET /query?q=...`.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use retrieval::{IndexManager, QueryEngine};
pub use types::{Chunk, Document, FileType, QueryParams, QueryResponse, SearchHit};
