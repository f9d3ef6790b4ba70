//! Directory document loader

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::parser::FileParser;
use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::types::document::{META_FILE_PATH, META_FILE_SIZE};
use crate::types::{Document, FileType};

/// Loads every supported file in a directory as a [`Document`]
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    /// Directory to read
    data_dir: PathBuf,
    /// Descend into subdirectories
    recursive: bool,
    /// Maximum file size in bytes
    max_file_size: u64,
}

impl DirectoryLoader {
    /// Create a loader for the top level of `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let defaults = IngestionConfig::default();
        Self {
            data_dir: data_dir.into(),
            recursive: defaults.recursive,
            max_file_size: defaults.max_file_size,
        }
    }

    /// Create from ingestion configuration
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            recursive: config.recursive,
            max_file_size: config.max_file_size,
        }
    }

    /// Also load files from subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Override the maximum file size
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Directory this loader reads
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load all documents, in file-name order
    ///
    /// Fails with a configuration error when the directory is missing or
    /// yields no documents. PDFs without extractable text are skipped; any
    /// other read or parse failure aborts the load.
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.data_dir.is_dir() {
            return Err(Error::config(format!(
                "Document directory '{}' does not exist",
                self.data_dir.display()
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        let mut documents = Vec::new();

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if !FileType::from_filename(&file_name).is_supported() {
                tracing::debug!("Skipping unsupported file {}", entry.path().display());
                continue;
            }

            if let Some(doc) = self.load_file(entry.path(), &file_name)? {
                documents.push(doc);
            }
        }

        if documents.is_empty() {
            return Err(Error::config(format!(
                "No documents found in '{}'! Please add PDFs or text files.",
                self.data_dir.display()
            )));
        }

        tracing::info!(
            "Loaded {} documents from {}",
            documents.len(),
            self.data_dir.display()
        );

        Ok(documents)
    }

    /// Load one file, returning `None` for a PDF without text
    fn load_file(&self, path: &Path, file_name: &str) -> Result<Option<Document>> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(Error::file_parse(
                file_name,
                format!("File is {} bytes, limit is {}", size, self.max_file_size),
            ));
        }

        let data = std::fs::read(path)?;
        let parsed = FileParser::parse(file_name, &data)?;

        if parsed.file_type == FileType::Pdf && !parsed.has_text() {
            tracing::warn!("{}: no extractable text, skipping", file_name);
            return Ok(None);
        }

        let doc = Document::new(parsed.content, parsed.file_type, file_name)
            .with_metadata(META_FILE_PATH, path.display().to_string())
            .with_metadata(META_FILE_SIZE, size.to_string());

        tracing::debug!(
            "Loaded {} ({} chars{})",
            file_name,
            doc.text.chars().count(),
            parsed
                .total_pages
                .map(|p| format!(", {} pages", p))
                .unwrap_or_default()
        );

        Ok(Some(doc))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}
