//! docinsight: document analysis with retrieval-grounded structured summaries
//!
//! Uploaded PDF, DOCX or plain-text documents are reduced to text, split into
//! overlapping chunks and embedded into a per-document in-memory index. The
//! chunks closest to a fixed analysis intent are handed to a generative model,
//! whose reply is normalized into a summary, insights, topics and sentiment.
//! Ollama and Gemini are supported as backends.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use processing::DocumentAnalyzer;
pub use types::{AnalysisReport, AnalysisResult, Chunk, FileType, RawDocument};
