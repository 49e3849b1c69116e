//! Document analysis pipeline orchestration

mod analyzer;

pub use analyzer::DocumentAnalyzer;
