use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::gap_analysis::collaborators::{
    CollaboratorError, Collaborators, ContentStructurer, Embedder, FileTextExtractor,
    RecommendationWriter,
};
use crate::workflows::gap_analysis::domain::{Mapping, SessionId, StructuredTopicSet};
use crate::workflows::gap_analysis::jobs::{
    InMemoryJobStore, JobRecord, JobStatus, JobStore, JobStoreError,
};
use crate::workflows::gap_analysis::service::AnalysisService;
use crate::workflows::gap_analysis::storage::FsArtifactStore;

pub(super) const NARRATIVE: &str = "### OVERALL ANALYSIS\nCover recursion before trees.\n";

/// Reads the first line as the subject and every further non-empty line as a topic.
pub(super) struct LineStructurer;

#[async_trait]
impl ContentStructurer for LineStructurer {
    async fn structure(&self, text: &str) -> Result<StructuredTopicSet, CollaboratorError> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        let subject = lines.next().unwrap_or_default().to_string();
        Ok(StructuredTopicSet::with_topics(&subject, lines))
    }
}

pub(super) struct MalformedStructurer;

#[async_trait]
impl ContentStructurer for MalformedStructurer {
    async fn structure(&self, _text: &str) -> Result<StructuredTopicSet, CollaboratorError> {
        Err(CollaboratorError::MalformedResponse(
            "no JSON object in model output".to_string(),
        ))
    }
}

/// Fixed unit vectors chosen so cosine scores match the curriculum scenario:
/// loops/iteration 0.85, loops/arrays 0.20, recursion/iteration 0.50,
/// recursion/arrays 0.55.
pub(super) struct ScenarioEmbedder {
    vectors: HashMap<&'static str, Vec<f32>>,
}

impl Default for ScenarioEmbedder {
    fn default() -> Self {
        let vectors = HashMap::from([
            ("iteration", vec![1.0, 0.0, 0.0, 0.0]),
            ("arrays", vec![0.0, 1.0, 0.0, 0.0]),
            ("loops", vec![0.85, 0.2, 0.2375_f32.sqrt(), 0.0]),
            ("recursion", vec![0.5, 0.55, 0.0, 0.4475_f32.sqrt()]),
        ]);
        Self { vectors }
    }
}

#[async_trait]
impl Embedder for ScenarioEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| CollaboratorError::Service(format!("status 503: no vector for {text}")))
    }
}

pub(super) struct FixedRecommender;

#[async_trait]
impl RecommendationWriter for FixedRecommender {
    async fn write(
        &self,
        _mapping: &Mapping,
        _curriculum: &StructuredTopicSet,
        _standards: &StructuredTopicSet,
    ) -> Result<String, CollaboratorError> {
        Ok(NARRATIVE.to_string())
    }
}

pub(super) fn collaborators() -> Collaborators {
    Collaborators {
        extractor: Arc::new(FileTextExtractor),
        structurer: Arc::new(LineStructurer),
        embedder: Arc::new(ScenarioEmbedder::default()),
        recommender: Arc::new(FixedRecommender),
    }
}

/// Job store that remembers every progress value written for any session.
#[derive(Default)]
pub(super) struct RecordingJobStore {
    inner: InMemoryJobStore,
    history: Mutex<Vec<(u8, JobStatus)>>,
}

impl RecordingJobStore {
    pub(super) fn progress(&self) -> Vec<u8> {
        self.history
            .lock()
            .expect("history lock")
            .iter()
            .map(|(progress, _)| *progress)
            .collect()
    }

    fn remember(&self, record: &JobRecord) {
        self.history
            .lock()
            .expect("history lock")
            .push((record.progress, record.status));
    }
}

impl JobStore for RecordingJobStore {
    fn begin(&self, record: JobRecord) -> Result<(), JobStoreError> {
        self.remember(&record);
        self.inner.begin(record)
    }

    fn replace(&self, record: JobRecord) -> Result<(), JobStoreError> {
        self.remember(&record);
        self.inner.replace(record)
    }

    fn get(&self, session_id: &SessionId) -> Result<Option<JobRecord>, JobStoreError> {
        self.inner.get(session_id)
    }
}

pub(super) fn write_document(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).expect("write document");
    path
}

pub(super) fn scenario_documents(dir: &Path) -> (PathBuf, PathBuf) {
    (
        write_document(dir, "curriculum.txt", &["CS1", "iteration", "arrays"]),
        write_document(dir, "standards.txt", &["ACM CS", "loops", "recursion"]),
    )
}

pub(super) type MemoryService = AnalysisService<InMemoryJobStore, FsArtifactStore>;

pub(super) fn build_service(root: &Path) -> Arc<MemoryService> {
    let artifacts = FsArtifactStore::new(root.join("results")).expect("results dir");
    let service = AnalysisService::new(
        Arc::new(InMemoryJobStore::new()),
        Arc::new(artifacts),
        collaborators(),
        root.join("data"),
    )
    .expect("service builds");
    Arc::new(service)
}

pub(super) async fn wait_for_terminal(service: &MemoryService, session_id: &SessionId) -> JobRecord {
    for _ in 0..200 {
        let record = service.get_status(session_id).expect("status readable");
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} never reached a terminal state");
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
