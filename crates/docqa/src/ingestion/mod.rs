//! Document ingestion: directory loading, text/PDF parsing and chunking

mod chunker;
mod loader;
mod parser;

pub use chunker::TextChunker;
pub use loader::DirectoryLoader;
pub use parser::{FileParser, ParsedDocument};
