use super::collaborators::{CollaboratorError, Embedder};
use super::domain::{AlignmentRecord, Mapping, StructuredTopicSet, SIMILARITY_FLOOR};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Pairs every standard topic with its most similar curriculum topic.
pub struct TopicAligner {
    embedder: Arc<dyn Embedder>,
}

impl TopicAligner {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Produces one record per standard topic, in input order.
    ///
    /// Each distinct topic string is embedded at most once per call. Any
    /// embedding failure aborts the whole run without a partial mapping.
    pub async fn align(
        &self,
        curriculum: &StructuredTopicSet,
        standards: &StructuredTopicSet,
    ) -> Result<Mapping, AlignmentError> {
        let mut cache = EmbeddingCache::new(self.embedder.as_ref());
        let mut mapping = Vec::with_capacity(standards.topics.len());

        for standard_topic in &standards.topics {
            let standard_vector = cache.vector(standard_topic).await?;

            let mut best_match: Option<&String> = None;
            let mut best_score = SIMILARITY_FLOOR;

            for curriculum_topic in &curriculum.topics {
                let curriculum_vector = cache.vector(curriculum_topic).await?;
                let score = cosine_similarity(&standard_vector, &curriculum_vector).ok_or_else(
                    || AlignmentError::DimensionMismatch {
                        left: standard_topic.clone(),
                        right: curriculum_topic.clone(),
                    },
                )?;

                // Strict comparison keeps the first-seen topic on ties.
                if score > best_score {
                    best_score = score;
                    best_match = Some(curriculum_topic);
                }
            }

            mapping.push(AlignmentRecord::from_score(
                standard_topic.clone(),
                best_match.cloned(),
                best_score,
            ));
        }

        debug!(
            standard_topics = standards.topics.len(),
            curriculum_topics = curriculum.topics.len(),
            embedding_calls = cache.calls(),
            "alignment finished"
        );

        Ok(mapping)
    }
}

struct EmbeddingCache<'a> {
    embedder: &'a dyn Embedder,
    vectors: HashMap<String, Arc<Vec<f32>>>,
}

impl<'a> EmbeddingCache<'a> {
    fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            vectors: HashMap::new(),
        }
    }

    async fn vector(&mut self, topic: &str) -> Result<Arc<Vec<f32>>, AlignmentError> {
        if let Some(vector) = self.vectors.get(topic) {
            return Ok(vector.clone());
        }

        let vector = self
            .embedder
            .embed(topic)
            .await
            .map_err(|source| AlignmentError::Embedding {
                topic: topic.to_string(),
                source,
            })?;
        let vector = Arc::new(vector);
        self.vectors.insert(topic.to_string(), vector.clone());
        Ok(vector)
    }

    fn calls(&self) -> usize {
        self.vectors.len()
    }
}

/// Cosine of the angle between two vectors.
///
/// Returns `None` when the dimensions differ; a zero-length vector scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return Some(0.0);
    }
    Some((dot / denom).clamp(-1.0, 1.0))
}

#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    #[error("failed to embed topic '{topic}': {source}")]
    Embedding {
        topic: String,
        #[source]
        source: CollaboratorError,
    },
    #[error("embeddings for '{left}' and '{right}' have different dimensions")]
    DimensionMismatch { left: String, right: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::gap_analysis::domain::AlignmentStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each topic to a fixed vector and counts embedding calls.
    #[derive(Default)]
    struct TableEmbedder {
        vectors: HashMap<&'static str, Vec<f32>>,
        calls: AtomicUsize,
    }

    impl TableEmbedder {
        fn with(mut self, topic: &'static str, vector: Vec<f32>) -> Self {
            self.vectors.insert(topic, vector);
            self
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| CollaboratorError::Service(format!("no vector for {text}")))
        }
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        let opposite = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).expect("same dims");
        assert!((opposite + 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn empty_curriculum_marks_every_topic_missing() {
        let embedder = Arc::new(
            TableEmbedder::default()
                .with("loops", vec![1.0, 0.0])
                .with("recursion", vec![0.0, 1.0]),
        );
        let aligner = TopicAligner::new(embedder);
        let curriculum = StructuredTopicSet::with_topics("CS1", Vec::<String>::new());
        let standards = StructuredTopicSet::with_topics("ACM", ["loops", "recursion"]);

        let mapping = aligner.align(&curriculum, &standards).await.expect("aligns");
        assert_eq!(mapping.len(), 2);
        for record in &mapping {
            assert_eq!(record.status, AlignmentStatus::Missing);
            assert!(record.closest_curriculum_topic.is_none());
            assert_eq!(record.similarity, SIMILARITY_FLOOR);
        }
    }

    #[tokio::test]
    async fn ties_keep_the_first_curriculum_topic() {
        let embedder = Arc::new(
            TableEmbedder::default()
                .with("loops", vec![1.0, 0.0])
                .with("for loops", vec![1.0, 0.0])
                .with("while loops", vec![2.0, 0.0]),
        );
        let aligner = TopicAligner::new(embedder);
        let curriculum = StructuredTopicSet::with_topics("CS1", ["for loops", "while loops"]);
        let standards = StructuredTopicSet::with_topics("ACM", ["loops"]);

        let mapping = aligner.align(&curriculum, &standards).await.expect("aligns");
        assert_eq!(mapping[0].closest_curriculum_topic.as_deref(), Some("for loops"));
        assert_eq!(mapping[0].status, AlignmentStatus::FullyAligned);
    }

    #[tokio::test]
    async fn each_distinct_topic_is_embedded_once() {
        let embedder = Arc::new(
            TableEmbedder::default()
                .with("a", vec![1.0, 0.0])
                .with("b", vec![0.0, 1.0])
                .with("x", vec![1.0, 1.0])
                .with("y", vec![1.0, -1.0]),
        );
        let aligner = TopicAligner::new(embedder.clone());
        let curriculum = StructuredTopicSet::with_topics("CS1", ["x", "y", "x"]);
        let standards = StructuredTopicSet::with_topics("ACM", ["a", "b", "a"]);

        let mapping = aligner.align(&curriculum, &standards).await.expect("aligns");
        assert_eq!(mapping.len(), 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn embedding_failures_abort_the_run() {
        let embedder = Arc::new(TableEmbedder::default().with("loops", vec![1.0, 0.0]));
        let aligner = TopicAligner::new(embedder);
        let curriculum = StructuredTopicSet::with_topics("CS1", ["unknown"]);
        let standards = StructuredTopicSet::with_topics("ACM", ["loops"]);

        match aligner.align(&curriculum, &standards).await {
            Err(AlignmentError::Embedding { topic, .. }) => assert_eq!(topic, "unknown"),
            other => panic!("expected embedding failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_reported() {
        let embedder = Arc::new(
            TableEmbedder::default()
                .with("loops", vec![1.0, 0.0])
                .with("arrays", vec![1.0, 0.0, 0.0]),
        );
        let aligner = TopicAligner::new(embedder);
        let curriculum = StructuredTopicSet::with_topics("CS1", ["arrays"]);
        let standards = StructuredTopicSet::with_topics("ACM", ["loops"]);

        assert!(matches!(
            aligner.align(&curriculum, &standards).await,
            Err(AlignmentError::DimensionMismatch { .. })
        ));
    }
}
