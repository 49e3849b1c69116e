//! Storage module for persistent data storage
//!
//! SQLite registry for file metadata and results, plus a filesystem store
//! for the uploaded bytes.

mod blob_store;
mod database;

pub use blob_store::LocalBlobStore;
pub use database::AnalysisDb;
