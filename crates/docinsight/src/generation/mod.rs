//! Prompt construction and model output normalization

pub mod normalizer;
pub mod prompt;

pub use normalizer::ResultNormalizer;
pub use prompt::PromptBuilder;
