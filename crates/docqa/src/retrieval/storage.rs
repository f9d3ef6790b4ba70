//! On-disk persistence for the vector index
//!
//! A storage directory holds three JSON files:
//! - `docstore.json`: chunk records (its presence marks the index as present)
//! - `vector_store.json`: chunk id to embedding
//! - `index_store.json`: the [`IndexManifest`]
//!
//! Writes go to a sibling staging directory that is swapped in once complete,
//! so a reader never observes a partially written index.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::index::{IndexManifest, VectorIndex, INDEX_FORMAT_VERSION};
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Chunk records; the marker file
pub const DOCSTORE_FILE: &str = "docstore.json";
/// Embeddings keyed by chunk id
pub const VECTOR_STORE_FILE: &str = "vector_store.json";
/// Index manifest
pub const INDEX_STORE_FILE: &str = "index_store.json";

/// Swap attempts before a persist gives up on a contended storage directory
const SWAP_ATTEMPTS: usize = 5;

/// Whether a persisted index exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Absent,
    Present,
}

#[derive(Serialize, Deserialize)]
struct DocStore {
    chunks: Vec<Chunk>,
}

#[derive(Serialize, Deserialize)]
struct VectorStore {
    embeddings: HashMap<Uuid, Vec<f32>>,
}

/// Reads and writes a [`VectorIndex`] under one storage directory
#[derive(Debug, Clone)]
pub struct IndexStore {
    storage_dir: PathBuf,
}

impl IndexStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Storage directory
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Present iff the marker file exists
    pub fn state(&self) -> IndexState {
        if self.storage_dir.join(DOCSTORE_FILE).is_file() {
            IndexState::Present
        } else {
            IndexState::Absent
        }
    }

    /// Load the persisted index
    pub fn load(&self) -> Result<VectorIndex> {
        if self.state() == IndexState::Absent {
            return Err(Error::MissingIndex(self.storage_dir.clone()));
        }

        let docstore: DocStore = self.read_json(DOCSTORE_FILE)?;
        let mut vector_store: VectorStore = self.read_json(VECTOR_STORE_FILE)?;
        let manifest: IndexManifest = self.read_json(INDEX_STORE_FILE)?;

        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::storage(format!(
                "Unsupported index format version {} (expected {})",
                manifest.format_version, INDEX_FORMAT_VERSION
            )));
        }

        let vectors = docstore
            .chunks
            .iter()
            .map(|chunk| {
                vector_store.embeddings.remove(&chunk.id).ok_or_else(|| {
                    Error::storage(format!("No embedding stored for chunk {}", chunk.id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        VectorIndex::from_parts(manifest, docstore.chunks, vectors)
    }

    /// Write `index`, replacing any index already stored
    pub fn persist(&self, index: &VectorIndex) -> Result<()> {
        let name = self
            .storage_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::config(format!(
                    "Invalid storage directory '{}'",
                    self.storage_dir.display()
                ))
            })?
            .to_string();
        let parent = match self.storage_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let staging = parent.join(format!(".{}.building-{}", name, Uuid::new_v4()));
        fs::create_dir(&staging)?;

        if let Err(e) = write_index(&staging, index) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let mut attempt = 1;
        loop {
            let retired = parent.join(format!(".{}.old-{}", name, Uuid::new_v4()));
            match self.swap_in(&staging, &retired) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < SWAP_ATTEMPTS => {
                    tracing::debug!(
                        "Index swap into {} failed (attempt {}): {}",
                        self.storage_dir.display(),
                        attempt,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    let _ = fs::remove_dir_all(&staging);
                    return Err(e.into());
                }
            }
        }
    }

    /// Move the current index aside, rename `staging` into place and drop the old copy
    ///
    /// A storage directory that vanishes between the check and the rename
    /// (another writer swapping concurrently) is treated as absent.
    fn swap_in(&self, staging: &Path, retired: &Path) -> io::Result<()> {
        let had_index = match fs::rename(&self.storage_dir, retired) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };

        if let Err(e) = fs::rename(staging, &self.storage_dir) {
            if had_index && fs::rename(retired, &self.storage_dir).is_err() {
                let _ = fs::remove_dir_all(retired);
            }
            return Err(e);
        }

        if had_index {
            if let Err(e) = fs::remove_dir_all(retired) {
                tracing::warn!("Failed to remove old index at {}: {}", retired.display(), e);
            }
        }
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<T> {
        let path = self.storage_dir.join(file);
        let bytes = fs::read(&path)
            .map_err(|e| Error::storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::storage(format!("Corrupt {}: {}", path.display(), e)))
    }
}

fn write_index(dir: &Path, index: &VectorIndex) -> Result<()> {
    let embeddings = index
        .chunks()
        .iter()
        .zip(index.vectors())
        .map(|(chunk, vector)| (chunk.id, vector.clone()))
        .collect();

    fs::write(
        dir.join(VECTOR_STORE_FILE),
        serde_json::to_vec(&VectorStore { embeddings })?,
    )?;
    fs::write(
        dir.join(INDEX_STORE_FILE),
        serde_json::to_vec_pretty(index.manifest())?,
    )?;
    fs::write(
        dir.join(DOCSTORE_FILE),
        serde_json::to_vec(&DocStore {
            chunks: index.chunks().to_vec(),
        })?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, FileType};
    use tempfile::TempDir;

    fn sample_index(texts: &[&str]) -> VectorIndex {
        let doc = Document::new(texts.join("\n"), FileType::Txt, "notes.txt");
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(&doc, t.to_string(), i as u32, 0, t.len()))
            .collect();
        let vectors = (0..texts.len())
            .map(|i| vec![i as f32, 1.0, 0.5])
            .collect();
        VectorIndex::new(chunks, vectors, "test-model", 1).unwrap()
    }

    #[test]
    fn test_absent_until_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("storage"));

        assert_eq!(store.state(), IndexState::Absent);
        assert!(matches!(store.load(), Err(Error::MissingIndex(_))));
    }

    #[test]
    fn test_persist_and_load() {
        let tmp = TempDir::new().unwrap();
        let storage_dir = tmp.path().join("storage");
        let store = IndexStore::new(&storage_dir);
        let index = sample_index(&["alpha", "beta"]);

        store.persist(&index).unwrap();

        assert_eq!(store.state(), IndexState::Present);
        for file in [DOCSTORE_FILE, VECTOR_STORE_FILE, INDEX_STORE_FILE] {
            assert!(storage_dir.join(file).is_file(), "{file} missing");
        }

        let loaded = store.load().unwrap();
        assert_eq!(loaded.chunks(), index.chunks());
        assert_eq!(loaded.vectors(), index.vectors());
        assert_eq!(loaded.manifest(), index.manifest());
    }

    #[test]
    fn test_persist_replaces_existing_index() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("storage"));

        store.persist(&sample_index(&["old one", "old two"])).unwrap();
        store.persist(&sample_index(&["new"])).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.chunks()[0].text, "new");

        // Only the storage directory itself remains; staging and retired copies are gone
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_concurrent_persists_leave_one_complete_index() {
        let tmp = TempDir::new().unwrap();
        let storage_dir = tmp.path().join("storage");
        IndexStore::new(&storage_dir)
            .persist(&sample_index(&["seed"]))
            .unwrap();

        let barrier = std::sync::Arc::new(std::sync::Barrier::new(2));
        let writers: Vec<_> = [&["first a", "first b"][..], &["second"][..]]
            .into_iter()
            .map(|texts| {
                let store = IndexStore::new(&storage_dir);
                let index = sample_index(texts);
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.persist(&index)
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap().unwrap();
        }

        let loaded = IndexStore::new(&storage_dir).load().unwrap();
        assert!(loaded.len() == 1 || loaded.len() == 2);
        assert!(loaded.chunks().iter().all(|c| c.text != "seed"));

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_vector_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let storage_dir = tmp.path().join("storage");
        let store = IndexStore::new(&storage_dir);
        store.persist(&sample_index(&["alpha"])).unwrap();

        fs::write(storage_dir.join(VECTOR_STORE_FILE), r#"{"embeddings":{}}"#).unwrap();

        assert!(matches!(store.load(), Err(Error::Storage(_))));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let storage_dir = tmp.path().join("storage");
        let store = IndexStore::new(&storage_dir);
        store.persist(&sample_index(&["alpha"])).unwrap();

        fs::write(storage_dir.join(INDEX_STORE_FILE), "not json").unwrap();

        assert!(matches!(store.load(), Err(Error::Storage(_))));
    }
}
