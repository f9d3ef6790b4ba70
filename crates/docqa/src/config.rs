//! Configuration for the document QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the language-model API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the language-model API base URL
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Document ingestion configuration
    pub ingestion: IngestionConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Language-model API configuration
    pub llm: LlmConfig,
    /// Index storage configuration
    pub storage: StorageConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("Cannot read config file {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Fill secrets and overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.llm.base_url = url;
            }
        }
    }

    /// Check the settings that must hold before serving
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(Error::config(format!(
                "Language-model API key is missing! Set {} in the environment.",
                API_KEY_ENV
            )));
        }
        self.chunking.validate()?;
        if self.retrieval.similarity_top_k == 0 {
            return Err(Error::config("retrieval.similarity_top_k must be at least 1"));
        }
        if self.llm.embed_batch_size == 0 {
            return Err(Error::config("llm.embed_batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: false,
        }
    }
}

/// Document ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Directory holding the input documents
    pub data_dir: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Maximum size of a single input file in bytes (default: 100MB)
    pub max_file_size: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            recursive: false,
            max_file_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Text chunking configuration
///
/// Sizes are in tokens, converted to characters at [`CHARS_PER_TOKEN`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in tokens
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in tokens
    pub chunk_overlap: usize,
}

/// Characters per token used to turn token budgets into character windows
pub const CHARS_PER_TOKEN: usize = 4;

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Chunk size in characters
    pub fn chunk_chars(&self) -> usize {
        self.chunk_size * CHARS_PER_TOKEN
    }

    /// Overlap in characters
    pub fn overlap_chars(&self) -> usize {
        self.chunk_overlap * CHARS_PER_TOKEN
    }

    /// Reject empty windows and overlaps that would not advance
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be at least 1"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Language-model API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (OpenAI-compatible)
    pub base_url: String,
    /// API key, read from the environment and never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds (none by default)
    pub timeout_secs: Option<u64>,
    /// Number of chunks sent per embedding request
    pub embed_batch_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            embed_model: "text-embedding-ada-002".to_string(),
            generate_model: "gpt-4".to_string(),
            temperature: 0.0, // Deterministic decoding
            timeout_secs: None,
            embed_batch_size: 64,
        }
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted index
    pub storage_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./storage"),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to place in the prompt
    pub similarity_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { similarity_top_k: 2 }
    }
}
