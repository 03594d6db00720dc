//! Curriculum gap analysis: align a curriculum's topics against a standard,
//! report the gaps, and track each run through its pipeline stages.

pub mod alignment;
pub mod collaborators;
pub mod domain;
pub mod jobs;
pub mod pipeline;
pub mod report;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use alignment::{cosine_similarity, AlignmentError, TopicAligner};
pub use collaborators::{
    CollaboratorError, Collaborators, ContentStructurer, Embedder, RecommendationWriter,
    TextExtractor,
};
pub use domain::{
    AlignmentRecord, AlignmentStatus, DocumentKind, Mapping, SessionId, StructuredTopicSet,
};
pub use jobs::{InMemoryJobStore, JobRecord, JobStatus, JobStore, PipelineStage};
pub use pipeline::{PipelineError, PipelineOrchestrator};
pub use report::{FinalReport, GapAggregator, GapEntry, GapSeverity};
pub use router::analysis_router;
pub use service::{AnalysisService, AnalysisServiceError, UploadReceipt, UploadedFile};
pub use storage::{ArtifactStore, FsArtifactStore, StorageError};
