use super::GeminiClient;
use crate::workflows::gap_analysis::collaborators::{CollaboratorError, ContentStructurer};
use crate::workflows::gap_analysis::domain::StructuredTopicSet;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GeminiStructurer {
    client: Arc<GeminiClient>,
}

impl GeminiStructurer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentStructurer for GeminiStructurer {
    async fn structure(&self, text: &str) -> Result<StructuredTopicSet, CollaboratorError> {
        let raw = self.client.generate(&structuring_prompt(text)).await?;
        parse_structured_response(&raw)
    }
}

pub(crate) fn structuring_prompt(text: &str) -> String {
    format!(
        r#"You are an AI curriculum parser.

Return ONLY valid JSON.
No explanations, no markdown, no extra text.

JSON Format:
{{
  "subject": "",
  "topics": [],
  "subtopics": [],
  "competencies": [],
  "learning_outcomes": []
}}

Extract based on the following content:

{text}
"#
    )
}

/// Pulls the topic set out of a model reply, tolerating code fences and
/// chatter around the JSON object.
pub(crate) fn parse_structured_response(raw: &str) -> Result<StructuredTopicSet, CollaboratorError> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => {
            return Err(CollaboratorError::MalformedResponse(
                "model did not return a JSON object".into(),
            ))
        }
    };

    serde_json::from_str(json)
        .map_err(|err| CollaboratorError::MalformedResponse(format!("invalid topic JSON: {err}")))
}
