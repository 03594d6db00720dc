//! Seams to the external services the pipeline depends on.
//!
//! Every trait here is a suspension point of an analysis run; nothing else in
//! the pipeline performs I/O against a remote system.

mod extract;
pub mod gemini;

pub use extract::{is_supported, FileTextExtractor, SUPPORTED_EXTENSIONS};
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiRecommender, GeminiStructurer};

use super::domain::{Mapping, StructuredTopicSet};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns an uploaded document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, CollaboratorError>;
}

/// Converts raw document text into a structured topic set.
#[async_trait]
pub trait ContentStructurer: Send + Sync {
    async fn structure(&self, text: &str) -> Result<StructuredTopicSet, CollaboratorError>;
}

/// Produces an embedding vector for a topic string.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

/// Writes the free-text narrative that accompanies a gap report.
#[async_trait]
pub trait RecommendationWriter: Send + Sync {
    async fn write(
        &self,
        mapping: &Mapping,
        curriculum: &StructuredTopicSet,
        standards: &StructuredTopicSet,
    ) -> Result<String, CollaboratorError>;
}

/// The four collaborators an orchestrator needs, bundled for injection.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn TextExtractor>,
    pub structurer: Arc<dyn ContentStructurer>,
    pub embedder: Arc<dyn Embedder>,
    pub recommender: Arc<dyn RecommendationWriter>,
}

impl Collaborators {
    /// Production wiring: local file extraction plus one shared Gemini client.
    pub fn gemini(client: GeminiClient) -> Self {
        let client = Arc::new(client);
        Self {
            extractor: Arc::new(FileTextExtractor),
            structurer: Arc::new(GeminiStructurer::new(client.clone())),
            embedder: Arc::new(GeminiEmbedder::new(client.clone())),
            recommender: Arc::new(GeminiRecommender::new(client)),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("collaborator misconfigured: {0}")]
    Configuration(String),
}
