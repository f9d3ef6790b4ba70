//! Provider abstractions for embeddings and LLM completion
//!
//! The query engine and index builder depend only on these traits.

pub mod embedding;
pub mod llm;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use openai::OpenAiClient;
