use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub(crate) parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    pub(crate) fn text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

/// Body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest<'a> {
    pub(crate) contents: Vec<Content<'a>>,
}

/// Body for `models/{model}:embedContent`.
#[derive(Debug, Serialize)]
pub(crate) struct EmbedContentRequest<'a> {
    pub(crate) model: String,
    pub(crate) content: Content<'a>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any.
    pub(crate) fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidatePart {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbedContentResponse {
    pub(crate) embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEmbedding {
    pub(crate) values: Vec<f32>,
}
