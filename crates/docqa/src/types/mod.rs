//! Core types for the document QA service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType};
pub use query::QueryParams;
pub use response::{QueryResponse, SearchHit};
