//! Normalization of raw model output into the fixed analysis schema
//!
//! Never fails: unparseable output falls back to a synthesized result.

use serde_json::{Map, Value};

use crate::config::NormalizerConfig;
use crate::types::analysis::{DEFAULT_SENTIMENT, INVALID_JSON_INSIGHT};
use crate::types::{AnalysisResult, Normalized};

/// Turns raw model text into an [`AnalysisResult`]
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    /// Chars of raw text kept as the fallback summary
    fallback_summary_chars: usize,
}

impl Default for ResultNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }
}

impl ResultNormalizer {
    /// Create a normalizer from configuration
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            fallback_summary_chars: config.fallback_summary_chars,
        }
    }

    /// Normalize a raw response
    pub fn normalize(&self, raw: &str) -> Normalized {
        let trimmed = raw.trim();

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => Normalized::Parsed(from_object(&map)),
            Ok(_) => {
                tracing::warn!("Model returned JSON that is not an object; using fallback");
                Normalized::Fallback(self.fallback(trimmed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Model did not return valid JSON; using fallback");
                Normalized::Fallback(self.fallback(trimmed))
            }
        }
    }

    fn fallback(&self, trimmed: &str) -> AnalysisResult {
        AnalysisResult {
            summary: trimmed.chars().take(self.fallback_summary_chars).collect(),
            insights: vec![INVALID_JSON_INSIGHT.to_string()],
            topics: Vec::new(),
            sentiment: DEFAULT_SENTIMENT.to_string(),
        }
    }
}

fn from_object(map: &Map<String, Value>) -> AnalysisResult {
    let result = AnalysisResult {
        summary: map.get("summary").map(text_of).unwrap_or_default(),
        insights: map.get("insights").map(list_of).unwrap_or_default(),
        topics: map.get("topics").map(list_of).unwrap_or_default(),
        sentiment: match map.get("sentiment") {
            Some(Value::String(s)) => s.clone(),
            _ => DEFAULT_SENTIMENT.to_string(),
        },
    };

    if !result.has_known_sentiment() {
        tracing::warn!(sentiment = %result.sentiment, "Model returned an unknown sentiment label");
    }

    result
}

/// Strings as-is, null as empty, anything else as its JSON text
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Arrays item by item (nulls dropped), a lone scalar as one item
fn list_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(text_of)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![text_of(other)],
    }
}
