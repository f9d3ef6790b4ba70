//! Vector index, persistence and the query engine built on them

pub mod engine;
pub mod index;
pub mod manager;
pub mod storage;

pub use engine::QueryEngine;
pub use index::{IndexManifest, VectorIndex};
pub use manager::IndexManager;
pub use storage::{IndexState, IndexStore};
