//! Structured analysis output

use serde::{Deserialize, Serialize};

/// Sentiment labels the model is asked to choose from
pub const SENTIMENT_LABELS: [&str; 3] = ["positive", "neutral", "negative"];

/// Sentiment used whenever none can be determined
pub const DEFAULT_SENTIMENT: &str = "neutral";

/// Summary reported for documents without any content
pub const NO_CONTENT_SUMMARY: &str = "No content available.";

/// Sentinel insight used when the model output could not be parsed
pub const INVALID_JSON_INSIGHT: &str = "Model did not return valid JSON.";

/// Fixed four-field analysis of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short summary
    pub summary: String,
    /// Key insights, in model order
    pub insights: Vec<String>,
    /// Topics, in model order
    pub topics: Vec<String>,
    /// Sentiment label; normally one of [`SENTIMENT_LABELS`]
    pub sentiment: String,
}

impl AnalysisResult {
    /// Result for a document that produced no chunks
    pub fn no_content() -> Self {
        Self {
            summary: NO_CONTENT_SUMMARY.to_string(),
            insights: Vec::new(),
            topics: Vec::new(),
            sentiment: DEFAULT_SENTIMENT.to_string(),
        }
    }

    /// Whether the sentiment is one of the three known labels
    pub fn has_known_sentiment(&self) -> bool {
        SENTIMENT_LABELS.contains(&self.sentiment.as_str())
    }
}

/// Outcome of normalizing a raw model response
///
/// Both variants carry a complete result; the variant records whether it
/// came from the model's JSON or was synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The response parsed as a JSON object
    Parsed(AnalysisResult),
    /// The response was not a JSON object; result synthesized from raw text
    Fallback(AnalysisResult),
}

impl Normalized {
    /// Borrow the result
    pub fn result(&self) -> &AnalysisResult {
        match self {
            Self::Parsed(r) | Self::Fallback(r) => r,
        }
    }

    /// Take the result
    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::Parsed(r) | Self::Fallback(r) => r,
        }
    }

    /// True for the fallback branch
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Origin tag for reporting and persistence
    pub fn origin(&self) -> ResultOrigin {
        match self {
            Self::Parsed(_) => ResultOrigin::Parsed,
            Self::Fallback(_) => ResultOrigin::Fallback,
        }
    }
}

/// Where an analysis result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    /// Parsed from model JSON
    Parsed,
    /// Synthesized from unparseable model output
    Fallback,
    /// Fixed result for a document without chunks
    NoContent,
}

impl ResultOrigin {
    /// Stable string form (used as the database value)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Fallback => "fallback",
            Self::NoContent => "no_content",
        }
    }

    /// Parse the stable string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parsed" => Some(Self::Parsed),
            "fallback" => Some(Self::Fallback),
            "no_content" => Some(Self::NoContent),
            _ => None,
        }
    }
}

/// Analysis result with pipeline metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The analysis
    pub result: AnalysisResult,
    /// How the result was obtained
    pub origin: ResultOrigin,
    /// Extracted text length in chars
    pub text_length: usize,
    /// Chunks produced from the text
    pub total_chunks: usize,
    /// Chunks placed into the prompt context
    pub chunks_used: usize,
    /// Wall-clock processing time
    pub processing_time_ms: u64,
}
