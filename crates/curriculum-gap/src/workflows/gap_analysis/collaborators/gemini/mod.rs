//! Google Gemini REST adapter backing structuring, embedding and
//! recommendation generation.

mod recommender;
mod structurer;
mod types;

pub use recommender::GeminiRecommender;
pub use structurer::GeminiStructurer;

use super::{CollaboratorError, Embedder};
use crate::config::GeminiConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use types::{
    Content, EmbedContentRequest, EmbedContentResponse, GenerateContentRequest,
    GenerateContentResponse,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embed_model: String,
}

impl GeminiClient {
    pub fn from_config(config: &GeminiConfig) -> Result<Self, CollaboratorError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CollaboratorError::Configuration("GEMINI_API_KEY not set".into()))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| CollaboratorError::Configuration(err.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            embed_model: config.embed_model.clone(),
        })
    }

    /// Single-turn text generation with the configured model.
    pub async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting generation");
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        response.first_text().ok_or_else(|| {
            CollaboratorError::MalformedResponse("model returned no text candidates".into())
        })
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        let url = format!("{}/models/{}:embedContent", self.base_url, self.embed_model);
        let body = EmbedContentRequest {
            model: format!("models/{}", self.embed_model),
            content: Content::text(text),
        };

        let response: EmbedContentResponse = self.post_json(&url, &body).await?;
        if response.embedding.values.is_empty() {
            return Err(CollaboratorError::MalformedResponse(
                "embedding response contained no values".into(),
            ));
        }
        Ok(response.embedding.values)
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, CollaboratorError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CollaboratorError::Service(format!("request to {url} timed out"))
                } else {
                    CollaboratorError::Service(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Service(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        self.client.embed(text).await
    }
}
