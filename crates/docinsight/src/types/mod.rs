//! Core types for the analysis pipeline

pub mod analysis;
pub mod document;
pub mod file_record;
pub mod response;

pub use analysis::{AnalysisReport, AnalysisResult, Normalized, ResultOrigin};
pub use document::{Chunk, FileType, RawDocument};
pub use file_record::{FileRecord, FileStatus, StoredResult};
