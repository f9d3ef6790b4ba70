//! Query request types

use serde::{Deserialize, Serialize};

/// Query string parameters for `GET /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// The question to answer
    pub q: String,
}
