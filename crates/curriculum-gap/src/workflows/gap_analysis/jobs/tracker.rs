use super::super::domain::SessionId;
use super::record::{JobRecord, PipelineStage, ReportPaths};
use super::store::{JobStore, JobStoreError};
use std::sync::Arc;
use tracing::info;

/// Write handle owned by the single run driving a session.
///
/// Progress only moves forward, and `complete`/`fail` consume the tracker so
/// a terminal record can never be followed by another update from the same run.
pub struct JobTracker<J> {
    store: Arc<J>,
    session_id: SessionId,
    stage: PipelineStage,
}

impl<J> JobTracker<J>
where
    J: JobStore,
{
    pub fn begin(store: Arc<J>, session_id: SessionId) -> Result<Self, JobStoreError> {
        let stage = PipelineStage::Starting;
        store.begin(JobRecord::processing(session_id.clone(), stage))?;
        info!(%session_id, progress = stage.progress(), "analysis started");
        Ok(Self {
            store,
            session_id,
            stage,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn advance(&mut self, stage: PipelineStage) -> Result<(), JobTransitionError> {
        if stage.progress() <= self.stage.progress() {
            return Err(JobTransitionError::Regression {
                from: self.stage,
                to: stage,
            });
        }

        self.store
            .replace(JobRecord::processing(self.session_id.clone(), stage))?;
        self.stage = stage;
        info!(
            session_id = %self.session_id,
            ?stage,
            progress = stage.progress(),
            "{}",
            stage.message()
        );
        Ok(())
    }

    pub fn complete(self, paths: ReportPaths) -> Result<JobRecord, JobStoreError> {
        let record = JobRecord::completed(self.session_id, paths);
        self.store.replace(record.clone())?;
        Ok(record)
    }

    pub fn fail(self, diagnostic: &str) -> Result<JobRecord, JobStoreError> {
        let record = JobRecord::failed(self.session_id, diagnostic);
        self.store.replace(record.clone())?;
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobTransitionError {
    #[error("progress cannot move from {from:?} back to {to:?}")]
    Regression {
        from: PipelineStage,
        to: PipelineStage,
    },
    #[error(transparent)]
    Store(#[from] JobStoreError),
}
