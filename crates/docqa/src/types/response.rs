//! Response types for queries

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// Body of a successful `GET /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer, verbatim from the model
    pub response: String,
}

impl QueryResponse {
    /// Wrap an answer
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(QueryResponse::new("42")).unwrap();
        assert_eq!(json, serde_json::json!({ "response": "42" }));
    }
}
