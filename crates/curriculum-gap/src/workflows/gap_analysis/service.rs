use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::collaborators::{is_supported, Collaborators, SUPPORTED_EXTENSIONS};
use super::domain::{DocumentKind, Mapping, SessionId};
use super::jobs::{JobRecord, JobStatus, JobStore, JobStoreError};
use super::pipeline::PipelineOrchestrator;
use super::report::FinalReport;
use super::storage::{ArtifactStore, StorageError};

/// A document received from a caller, before it is written to the upload dir.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Stored names of an accepted upload pair, handed back to callers so they can
/// start a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub session_id: SessionId,
    pub curriculum: String,
    pub standards: String,
}

/// Intake, run submission and retrieval for analysis sessions.
pub struct AnalysisService<J, S> {
    jobs: Arc<J>,
    artifacts: Arc<S>,
    orchestrator: Arc<PipelineOrchestrator<J, S>>,
    upload_dir: PathBuf,
}

impl<J, S> AnalysisService<J, S>
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        artifacts: Arc<S>,
        collaborators: Collaborators,
        upload_dir: impl Into<PathBuf>,
    ) -> Result<Self, AnalysisServiceError> {
        let orchestrator = PipelineOrchestrator::new(jobs.clone(), artifacts.clone(), collaborators);
        Self::with_orchestrator(jobs, artifacts, Arc::new(orchestrator), upload_dir)
    }

    pub fn with_orchestrator(
        jobs: Arc<J>,
        artifacts: Arc<S>,
        orchestrator: Arc<PipelineOrchestrator<J, S>>,
        upload_dir: impl Into<PathBuf>,
    ) -> Result<Self, AnalysisServiceError> {
        let upload_dir = upload_dir.into();
        fs::create_dir_all(&upload_dir).map_err(|source| StorageError::Io {
            path: upload_dir.clone(),
            source,
        })?;

        Ok(Self {
            jobs,
            artifacts,
            orchestrator,
            upload_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validates both documents before writing either, then stores them
    /// under a fresh session id.
    pub fn save_uploads(
        &self,
        curriculum: UploadedFile,
        standards: UploadedFile,
    ) -> Result<UploadReceipt, AnalysisServiceError> {
        for file in [&curriculum, &standards] {
            if file.file_name.trim().is_empty() {
                return Err(AnalysisServiceError::Input("No selected file".to_string()));
            }
            if !is_supported(&file.file_name) {
                return Err(AnalysisServiceError::Input(format!(
                    "Allowed file types: {}",
                    SUPPORTED_EXTENSIONS.join(", ")
                )));
            }
        }

        let session_id = SessionId::generate();
        let curriculum = self.save_upload(&session_id, DocumentKind::Curriculum, curriculum)?;
        let standards = self.save_upload(&session_id, DocumentKind::Standards, standards)?;
        info!(%session_id, %curriculum, %standards, "documents uploaded");

        Ok(UploadReceipt {
            session_id,
            curriculum,
            standards,
        })
    }

    /// Writes one document as `{kind}_{session}.{ext}` and returns that name.
    pub fn save_upload(
        &self,
        session_id: &SessionId,
        kind: DocumentKind,
        file: UploadedFile,
    ) -> Result<String, AnalysisServiceError> {
        let extension = Path::new(&file.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                AnalysisServiceError::Input(format!(
                    "Allowed file types: {}",
                    SUPPORTED_EXTENSIONS.join(", ")
                ))
            })?;

        let stored_name = format!("{}_{}.{}", kind.label(), session_id, extension);
        let path = self.upload_dir.join(&stored_name);
        fs::write(&path, &file.bytes).map_err(|source| StorageError::Io { path, source })?;
        Ok(stored_name)
    }

    /// Claims the session and hands the run to the runtime without awaiting it.
    pub fn start_run(
        &self,
        session_id: &str,
        curriculum_file: &str,
        standards_file: &str,
    ) -> Result<SessionId, AnalysisServiceError> {
        if [session_id, curriculum_file, standards_file]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(AnalysisServiceError::Input(
                "Missing required parameters".to_string(),
            ));
        }

        let session_id = SessionId::parse(session_id).ok_or_else(invalid_session_id)?;
        let curriculum = self.resolve_upload(curriculum_file)?;
        let standards = self.resolve_upload(standards_file)?;

        let tracker = self
            .orchestrator
            .begin(session_id.clone())
            .map_err(|err| match err {
                JobStoreError::AlreadyRunning(_) => {
                    AnalysisServiceError::Input("analysis already running".to_string())
                }
                other => AnalysisServiceError::Jobs(other),
            })?;

        self.orchestrator.spawn(tracker, curriculum, standards);
        Ok(session_id)
    }

    pub fn get_status(&self, session_id: &SessionId) -> Result<JobRecord, AnalysisServiceError> {
        ensure_valid(session_id)?;
        self.jobs
            .get(session_id)?
            .ok_or_else(|| AnalysisServiceError::NotFound("Session not found".to_string()))
    }

    /// Completed report for a session. Never serves a report while the
    /// session's current run is still processing or has failed.
    pub fn get_report(&self, session_id: &SessionId) -> Result<FinalReport, AnalysisServiceError> {
        self.ensure_not_pending(session_id)?;
        self.artifacts
            .load_report(session_id)?
            .ok_or_else(|| AnalysisServiceError::NotFound("Report not found".to_string()))
    }

    pub fn get_mapping(&self, session_id: &SessionId) -> Result<Mapping, AnalysisServiceError> {
        ensure_valid(session_id)?;
        self.artifacts
            .load_mapping(session_id)?
            .ok_or_else(|| AnalysisServiceError::NotFound("Mapping data not found".to_string()))
    }

    pub fn report_document(&self, session_id: &SessionId) -> Result<String, AnalysisServiceError> {
        self.ensure_not_pending(session_id)?;
        self.artifacts
            .report_document(session_id)?
            .ok_or_else(|| AnalysisServiceError::NotFound("Report document not found".to_string()))
    }

    fn ensure_not_pending(&self, session_id: &SessionId) -> Result<(), AnalysisServiceError> {
        ensure_valid(session_id)?;
        match self.jobs.get(session_id)? {
            Some(record) if record.status != JobStatus::Completed => {
                Err(AnalysisServiceError::NotReady(record))
            }
            _ => Ok(()),
        }
    }

    fn resolve_upload(&self, file_name: &str) -> Result<PathBuf, AnalysisServiceError> {
        // Stored names never contain separators; anything else is not ours.
        let is_plain_name = Path::new(file_name).file_name().and_then(|name| name.to_str())
            == Some(file_name);
        let path = self.upload_dir.join(file_name);
        if !is_plain_name || !path.is_file() {
            return Err(AnalysisServiceError::NotFound(
                "Uploaded files not found".to_string(),
            ));
        }
        Ok(path)
    }
}

fn ensure_valid(session_id: &SessionId) -> Result<(), AnalysisServiceError> {
    if session_id.is_valid() {
        Ok(())
    } else {
        Err(invalid_session_id())
    }
}

fn invalid_session_id() -> AnalysisServiceError {
    AnalysisServiceError::Input(
        "session_id may only contain letters, digits, '-' and '_'".to_string(),
    )
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    NotFound(String),
    #[error("report not ready: session is {}", .0.status.label())]
    NotReady(JobRecord),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Jobs(#[from] JobStoreError),
    #[error("background task failed: {0}")]
    Task(String),
}
