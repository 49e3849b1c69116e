//! Vector index and intent-driven retrieval

mod index;
mod retriever;

pub use index::{ScoredChunk, VectorIndex};
pub use retriever::{RetrievedContext, Retriever};
