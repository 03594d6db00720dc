use crate::cli::ServeArgs;
use crate::infra::{build_analysis_service, gemini_collaborators, AppState};
use crate::routes::with_analysis_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use curriculum_gap::config::AppConfig;
use curriculum_gap::error::AppError;
use curriculum_gap::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let collaborators = gemini_collaborators(&config.gemini)?;
    let analysis_service = build_analysis_service(&config, collaborators)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        gemini_configured: config.gemini.is_configured(),
    };

    let app = with_analysis_routes(analysis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.storage.upload_dir.display(),
        results_dir = %config.storage.results_dir.display(),
        "curriculum gap service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
