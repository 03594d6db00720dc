use crate::infra::gemini_collaborators;
use clap::Args;
use curriculum_gap::config::AppConfig;
use curriculum_gap::error::AppError;
use curriculum_gap::telemetry;
use curriculum_gap::workflows::gap_analysis::{
    AnalysisServiceError, ArtifactStore, FinalReport, FsArtifactStore, InMemoryJobStore,
    PipelineOrchestrator, SessionId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Curriculum document (.pdf, .docx or .txt)
    #[arg(long)]
    pub(crate) curriculum: PathBuf,
    /// Standard or benchmark document (.pdf, .docx or .txt)
    #[arg(long)]
    pub(crate) standards: PathBuf,
    /// Session id used to name the artifacts. Generated when omitted.
    #[arg(long)]
    pub(crate) session_id: Option<String>,
    /// Override the configured results directory
    #[arg(long)]
    pub(crate) results_dir: Option<PathBuf>,
}

pub(crate) async fn run_analysis(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        curriculum,
        standards,
        session_id,
        results_dir,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let collaborators = gemini_collaborators(&config.gemini)?;
    let results_dir = results_dir.unwrap_or(config.storage.results_dir);
    let artifacts = Arc::new(FsArtifactStore::new(&results_dir)?);
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(InMemoryJobStore::new()),
        artifacts.clone(),
        collaborators,
    );

    let session_id = match session_id {
        Some(raw) => SessionId::parse(&raw).ok_or_else(|| {
            AnalysisServiceError::Input(format!("invalid session id '{raw}'"))
        })?,
        None => SessionId::generate(),
    };
    println!("Curriculum gap analysis, session {session_id}");

    let record = orchestrator
        .run(session_id.clone(), &curriculum, &standards)
        .await?;
    let report = artifacts.load_report(&session_id)?.ok_or_else(|| {
        AnalysisServiceError::NotFound(format!("report for {session_id} was not persisted"))
    })?;

    render_report(&report);
    if let Some(paths) = record.report_paths {
        println!("\nArtifacts");
        println!("- report: {}", paths.json.display());
        println!("- document: {}", paths.document.display());
        println!("- mapping: {}", paths.mapping.display());
    }

    Ok(())
}

fn render_report(report: &FinalReport) {
    let summary = &report.summary;
    println!(
        "Coverage {} ({} of {} standard topics) | alignment score {}",
        summary.coverage, summary.topics_covered, summary.total_topics, summary.alignment_score
    );

    if report.gaps.is_empty() {
        println!("No gaps identified.");
        return;
    }

    println!("\nGaps ({})", summary.gaps);
    for gap in &report.gaps {
        println!(
            "  #{} [{}] {}: {}",
            gap.id,
            gap.severity.label(),
            gap.topic,
            gap.recommendation
        );
    }
}
