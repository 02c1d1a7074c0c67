//! Logical-fallacy analysis of a transcript
//!
//! JSON-mode chat call against the fallacy rubric. Any failure, transport or
//! parse, yields `None`; the caller decides how to report that.

use crate::models::FallacyAnalysisResult;
use crate::services::openai::{ChatMessage, OpenAiClient};

const FALLACY_SYSTEM_PROMPT: &str = r#"You are an expert in logic, rhetoric, and critical thinking. Analyze the following transcript for logical fallacies.

For each fallacy you identify:
1. Quote the exact passage (keep it brief—just the relevant sentence or two)
2. Name the fallacy
3. Categorize it (Relevance, Presumption, Ambiguity, Emotional Appeal, Statistical, Manipulation)
4. Rate severity: high (clearly flawed and potentially harmful), medium (problematic but subtle), low (minor or borderline)
5. Explain in 2-3 sentences why this qualifies as a fallacy
6. Provide a clearer example of the same fallacy pattern in a different context

Be conservative. Not every rhetorical flourish is a fallacy. Look for arguments where the reasoning is genuinely flawed, not just where you disagree with the conclusion.

Respond in JSON format:
{
  "summary": {
    "total_fallacies": number,
    "high_severity": number,
    "medium_severity": number,
    "low_severity": number,
    "primary_tactics": ["list of most common fallacy types used"]
  },
  "fallacies": [
    {
      "timestamp": "if available, otherwise null",
      "quote": "exact text",
      "fallacy_name": "name",
      "category": "category",
      "severity": "high|medium|low",
      "explanation": "why this is a fallacy",
      "clear_example": {
        "scenario": "a simpler example of the same pattern",
        "why_wrong": "brief explanation"
      }
    }
  ]
}"#;

/// Analyze a transcript for logical fallacies. `None` on any failure.
pub async fn analyze_fallacies(
    client: &OpenAiClient,
    transcript_text: &str,
) -> Option<FallacyAnalysisResult> {
    let messages = [
        ChatMessage::system(FALLACY_SYSTEM_PROMPT),
        ChatMessage::user(transcript_text),
    ];

    let outcome = match client.chat(&messages, true).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!("fallacy analysis failed: {err}");
            return None;
        }
    };

    match serde_json::from_str(&outcome.content) {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!("fallacy analysis returned unparseable JSON: {err}");
            None
        }
    }
}
