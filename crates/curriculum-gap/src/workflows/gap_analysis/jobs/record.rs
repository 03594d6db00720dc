use super::super::domain::SessionId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// Checkpoints a run passes through while `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Starting,
    Extracting,
    Structuring,
    Aligning,
    Recommending,
}

pub const COMPLETED_PROGRESS: u8 = 100;
pub const FAILED_PROGRESS: u8 = 0;

impl PipelineStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Starting,
            Self::Extracting,
            Self::Structuring,
            Self::Aligning,
            Self::Recommending,
        ]
    }

    pub const fn progress(self) -> u8 {
        match self {
            Self::Starting => 10,
            Self::Extracting => 20,
            Self::Structuring => 40,
            Self::Aligning => 60,
            Self::Recommending => 80,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::Starting => "Starting analysis...",
            Self::Extracting => "Extracting text from documents...",
            Self::Structuring => "Analyzing content structure...",
            Self::Aligning => "Computing similarity mapping...",
            Self::Recommending => "Generating recommendations...",
        }
    }
}

/// Locations of the artifacts persisted for a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub document: PathBuf,
    pub mapping: PathBuf,
}

/// Observable state of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub session_id: SessionId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_paths: Option<ReportPaths>,
}

impl JobRecord {
    pub fn processing(session_id: SessionId, stage: PipelineStage) -> Self {
        Self {
            session_id,
            status: JobStatus::Processing,
            progress: stage.progress(),
            message: stage.message().to_string(),
            report_id: None,
            report_paths: None,
        }
    }

    pub fn completed(session_id: SessionId, paths: ReportPaths) -> Self {
        Self {
            report_id: Some(session_id.clone()),
            session_id,
            status: JobStatus::Completed,
            progress: COMPLETED_PROGRESS,
            message: "Analysis completed successfully".to_string(),
            report_paths: Some(paths),
        }
    }

    pub fn failed(session_id: SessionId, diagnostic: &str) -> Self {
        Self {
            session_id,
            status: JobStatus::Failed,
            progress: FAILED_PROGRESS,
            message: format!("Analysis failed: {diagnostic}"),
            report_id: None,
            report_paths: None,
        }
    }
}
