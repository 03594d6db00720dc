use super::super::domain::SessionId;
use super::record::{JobRecord, JobStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Session-keyed job table shared by the running pipelines and status pollers.
///
/// Records are replaced whole, so a reader sees either the previous or the
/// next state of a session, never a mix.
pub trait JobStore: Send + Sync {
    /// Installs a fresh record unless the session already has a run in flight.
    fn begin(&self, record: JobRecord) -> Result<(), JobStoreError>;
    fn replace(&self, record: JobRecord) -> Result<(), JobStoreError>;
    fn get(&self, session_id: &SessionId) -> Result<Option<JobRecord>, JobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("analysis already running for session {0}")]
    AlreadyRunning(SessionId),
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    records: Arc<RwLock<HashMap<SessionId, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> JobStoreError {
    JobStoreError::Unavailable("job table lock poisoned".to_string())
}

impl JobStore for InMemoryJobStore {
    fn begin(&self, record: JobRecord) -> Result<(), JobStoreError> {
        let mut guard = self.records.write().map_err(poisoned)?;
        if let Some(existing) = guard.get(&record.session_id) {
            if existing.status == JobStatus::Processing {
                return Err(JobStoreError::AlreadyRunning(record.session_id));
            }
        }
        guard.insert(record.session_id.clone(), record);
        Ok(())
    }

    fn replace(&self, record: JobRecord) -> Result<(), JobStoreError> {
        let mut guard = self.records.write().map_err(poisoned)?;
        guard.insert(record.session_id.clone(), record);
        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> Result<Option<JobRecord>, JobStoreError> {
        let guard = self.records.read().map_err(poisoned)?;
        Ok(guard.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::gap_analysis::jobs::PipelineStage;

    #[test]
    fn begin_rejects_a_second_run_while_processing() {
        let store = InMemoryJobStore::new();
        let id = SessionId::from("s1");
        store
            .begin(JobRecord::processing(id.clone(), PipelineStage::Starting))
            .expect("first run starts");

        match store.begin(JobRecord::processing(id.clone(), PipelineStage::Starting)) {
            Err(JobStoreError::AlreadyRunning(session)) => assert_eq!(session, id),
            other => panic!("expected already running, got {other:?}"),
        }
    }

    #[test]
    fn terminal_records_are_overwritten_by_new_runs() {
        let store = InMemoryJobStore::new();
        let id = SessionId::from("s1");
        store
            .replace(JobRecord::failed(id.clone(), "extraction failed"))
            .expect("replace");

        store
            .begin(JobRecord::processing(id.clone(), PipelineStage::Starting))
            .expect("rerun allowed after failure");
        let current = store.get(&id).expect("read").expect("present");
        assert_eq!(current.status, JobStatus::Processing);
        assert_eq!(current.progress, 10);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_sessions_read_as_none() {
        let store = InMemoryJobStore::new();
        assert!(store.get(&SessionId::from("nope")).expect("read").is_none());
        assert!(store.is_empty());
    }
}
