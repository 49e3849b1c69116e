//! Prompt templates for document analysis

use crate::types::analysis::SENTIMENT_LABELS;

/// Prompt builder for analysis requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the structured-analysis prompt around the retrieved context.
    /// The context is embedded verbatim.
    pub fn build_analysis_prompt(context: &str) -> String {
        let labels = SENTIMENT_LABELS
            .iter()
            .map(|l| format!("\"{}\"", l))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are a document analyst. Read the document excerpts below and respond with a single JSON object containing exactly these keys:

- "summary": a short summary of the document, as a string
- "insights": an array of 3 to 7 key insights, each a string
- "topics": an array of the main topics, each a string
- "sentiment": the overall tone, one of [{labels}]

Output ONLY the JSON object. Do not add explanations, markdown or code fences.

DOCUMENT EXCERPTS:
{context}

JSON:"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_context_verbatim() {
        let context = "Revenue rose 12% in Q3.\n\nCosts fell.";
        let prompt = PromptBuilder::build_analysis_prompt(context);
        assert!(prompt.contains(context));
    }

    #[test]
    fn test_prompt_states_schema() {
        let prompt = PromptBuilder::build_analysis_prompt("x");
        for key in ["\"summary\"", "\"insights\"", "\"topics\"", "\"sentiment\""] {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(prompt.contains("3 to 7"));
        assert!(prompt.contains(r#""positive", "neutral", "negative""#));
        assert!(prompt.contains("ONLY the JSON object"));
    }

    #[test]
    fn test_prompt_is_pure() {
        assert_eq!(
            PromptBuilder::build_analysis_prompt("same"),
            PromptBuilder::build_analysis_prompt("same")
        );
    }
}
