//! Prompt templates for question answering

use crate::types::SearchHit;

/// Prompt builder for document QA queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from search results
    ///
    /// Each chunk is preceded by a `file_name: ...` line; chunks are separated
    /// by a blank line.
    pub fn build_context(hits: &[SearchHit]) -> String {
        hits.iter()
            .map(|hit| match hit.chunk.file_name() {
                Some(name) => format!("file_name: {}\n\n{}", name, hit.chunk.text),
                None => hit.chunk.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full question-answering prompt
    pub fn build_qa_prompt(query: &str, context: &str) -> String {
        format!(
            "Context information is below.\n\
             ---------------------\n\
             {context}\n\
             ---------------------\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: {query}\n\
             Answer: "
        )
    }

    /// Context and prompt in one step
    pub fn build(query: &str, hits: &[SearchHit]) -> String {
        Self::build_qa_prompt(query, &Self::build_context(hits))
    }
}
