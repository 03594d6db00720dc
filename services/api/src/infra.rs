use curriculum_gap::config::{AppConfig, GeminiConfig};
use curriculum_gap::error::AppError;
use curriculum_gap::workflows::gap_analysis::collaborators::GeminiClient;
use curriculum_gap::workflows::gap_analysis::{
    AnalysisService, Collaborators, FsArtifactStore, InMemoryJobStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const SERVICE_NAME: &str = "Curriculum Gap Identifier AI";

pub(crate) type GapAnalysisService = AnalysisService<InMemoryJobStore, FsArtifactStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) gemini_configured: bool,
}

/// Production collaborators; refuses to start without an API key.
pub(crate) fn gemini_collaborators(config: &GeminiConfig) -> Result<Collaborators, AppError> {
    config.require_api_key()?;
    let client = GeminiClient::from_config(config)?;
    Ok(Collaborators::gemini(client))
}

pub(crate) fn build_analysis_service(
    config: &AppConfig,
    collaborators: Collaborators,
) -> Result<Arc<GapAnalysisService>, AppError> {
    let artifacts = FsArtifactStore::new(&config.storage.results_dir)?;
    let service = AnalysisService::new(
        Arc::new(InMemoryJobStore::new()),
        Arc::new(artifacts),
        collaborators,
        &config.storage.upload_dir,
    )?;
    Ok(Arc::new(service))
}
