use super::alignment::{AlignmentError, TopicAligner};
use super::collaborators::{CollaboratorError, Collaborators};
use super::domain::{DocumentKind, SessionId, StructuredTopicSet};
use super::jobs::{
    JobRecord, JobStore, JobStoreError, JobTracker, JobTransitionError, PipelineStage, ReportPaths,
};
use super::report::GapAggregator;
use super::storage::{ArtifactStore, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Drives one analysis run through extraction, structuring, alignment,
/// recommendation and report assembly, recording each boundary in the job store.
pub struct PipelineOrchestrator<J, S> {
    jobs: Arc<J>,
    artifacts: Arc<S>,
    collaborators: Collaborators,
    aligner: TopicAligner,
    aggregator: GapAggregator,
}

impl<J, S> PipelineOrchestrator<J, S>
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    pub fn new(jobs: Arc<J>, artifacts: Arc<S>, collaborators: Collaborators) -> Self {
        let aligner = TopicAligner::new(collaborators.embedder.clone());
        Self {
            jobs,
            artifacts,
            collaborators,
            aligner,
            aggregator: GapAggregator::default(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: GapAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Claims the session for a new run. Fails while another run is in flight.
    pub fn begin(&self, session_id: SessionId) -> Result<JobTracker<J>, JobStoreError> {
        JobTracker::begin(self.jobs.clone(), session_id)
    }

    /// Runs the pipeline to a terminal state in the foreground.
    pub async fn run(
        &self,
        session_id: SessionId,
        curriculum: &Path,
        standards: &Path,
    ) -> Result<JobRecord, PipelineError> {
        let tracker = match self.begin(session_id.clone()) {
            Ok(tracker) => tracker,
            Err(err) => {
                warn!(%session_id, error = %err, "analysis not started");
                return Err(err.into());
            }
        };
        self.run_tracked(tracker, curriculum, standards).await
    }

    /// Moves an already-claimed run onto the runtime. The outcome is only
    /// observable through the job store.
    pub fn spawn(
        self: &Arc<Self>,
        tracker: JobTracker<J>,
        curriculum: PathBuf,
        standards: PathBuf,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let _ = orchestrator
                .run_tracked(tracker, &curriculum, &standards)
                .await;
        })
    }

    pub async fn run_tracked(
        &self,
        mut tracker: JobTracker<J>,
        curriculum: &Path,
        standards: &Path,
    ) -> Result<JobRecord, PipelineError> {
        match self.execute(&mut tracker, curriculum, standards).await {
            Ok(paths) => {
                let record = tracker.complete(paths)?;
                info!(session_id = %record.session_id, "analysis completed");
                Ok(record)
            }
            Err(err) => {
                let session_id = tracker.session_id().clone();
                let stage = tracker.stage();
                error!(%session_id, ?stage, error = %err, "analysis failed");
                tracker.fail(&err.to_string())?;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut JobTracker<J>,
        curriculum_path: &Path,
        standards_path: &Path,
    ) -> Result<ReportPaths, PipelineError> {
        let session_id = tracker.session_id().clone();

        tracker.advance(PipelineStage::Extracting)?;
        let extractor = &self.collaborators.extractor;
        let curriculum_text = extractor.extract_text(curriculum_path).await?;
        let standards_text = extractor.extract_text(standards_path).await?;

        tracker.advance(PipelineStage::Structuring)?;
        let curriculum = self
            .structure(&session_id, DocumentKind::Curriculum, &curriculum_text)
            .await?;
        let standards = self
            .structure(&session_id, DocumentKind::Standards, &standards_text)
            .await?;

        tracker.advance(PipelineStage::Aligning)?;
        let mapping = self.aligner.align(&curriculum, &standards).await?;
        let mapping_path = self.artifacts.save_mapping(&session_id, &mapping)?;

        tracker.advance(PipelineStage::Recommending)?;
        let narrative = self
            .collaborators
            .recommender
            .write(&mapping, &curriculum, &standards)
            .await?;

        let report = self.aggregator.aggregate(&session_id, mapping, narrative);
        info!(
            %session_id,
            coverage = %report.summary.coverage,
            gaps = report.summary.gaps,
            "report assembled"
        );
        Ok(self
            .artifacts
            .save_report(&session_id, &report, mapping_path)?)
    }

    async fn structure(
        &self,
        session_id: &SessionId,
        kind: DocumentKind,
        text: &str,
    ) -> Result<StructuredTopicSet, PipelineError> {
        let topics = self.collaborators.structurer.structure(text).await?;
        self.artifacts.save_structured(session_id, kind, &topics)?;
        info!(
            %session_id,
            document = kind.label(),
            topics = topics.topics.len(),
            "document structured"
        );
        Ok(topics)
    }
}

/// Failure of a run. The display text becomes the job's failure diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transition(#[from] JobTransitionError),
    #[error(transparent)]
    Jobs(#[from] JobStoreError),
}
