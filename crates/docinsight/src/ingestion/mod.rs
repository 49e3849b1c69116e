//! Document ingestion: text extraction and chunking

mod chunker;
mod extractor;

pub use chunker::TextChunker;
pub use extractor::TextExtractor;
