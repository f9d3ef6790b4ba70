//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the source filename
pub const META_FILE_NAME: &str = "file_name";
/// Metadata key carrying the source path
pub const META_FILE_PATH: &str = "file_path";
/// Metadata key carrying the file type
pub const META_FILE_TYPE: &str = "file_type";
/// Metadata key carrying the file size in bytes
pub const META_FILE_SIZE: &str = "file_size";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// MIME type recorded in document metadata
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// A loaded document, discarded once chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Extracted text
    pub text: String,
    /// File type
    pub file_type: FileType,
    /// Source metadata (file_name, file_path, ...)
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document tagged with its source filename
    pub fn new(text: String, file_type: FileType, file_name: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(META_FILE_NAME.to_string(), file_name.into());
        metadata.insert(META_FILE_TYPE.to_string(), file_type.mime_type().to_string());
        Self {
            id: Uuid::new_v4(),
            text,
            file_type,
            metadata,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Source filename
    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get(META_FILE_NAME).map(String::as_str)
    }
}

/// A bounded span of document text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Chunk text
    pub text: String,
    /// Position within the parent document
    pub chunk_index: u32,
    /// Character offset of the first character in the document text
    pub char_start: usize,
    /// Character offset one past the last character
    pub char_end: usize,
    /// Metadata inherited from the document
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Create a chunk of `document`
    pub fn new(
        document: &Document,
        text: String,
        chunk_index: u32,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            text,
            chunk_index,
            char_start,
            char_end,
            metadata: document.metadata.clone(),
        }
    }

    /// Source filename
    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get(META_FILE_NAME).map(String::as_str)
    }
}
