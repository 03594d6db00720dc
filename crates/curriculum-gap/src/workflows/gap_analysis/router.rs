use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::SessionId;
use super::jobs::JobStore;
use super::service::{AnalysisService, AnalysisServiceError, UploadedFile};
use super::storage::ArtifactStore;

/// HTTP endpoints for uploading documents, starting runs and reading results.
pub fn analysis_router<J, S>(service: Arc<AnalysisService<J, S>>) -> Router
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    Router::new()
        .route("/api/upload", post(upload_handler::<J, S>))
        .route("/api/process", post(process_handler::<J, S>))
        .route("/api/status/:session_id", get(status_handler::<J, S>))
        .route("/api/reports/:session_id", get(report_handler::<J, S>))
        .route(
            "/api/reports/:session_id/document",
            get(document_handler::<J, S>),
        )
        .route(
            "/api/results/:session_id/mapping",
            get(mapping_handler::<J, S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    curriculum: Option<String>,
    #[serde(default)]
    standards: Option<String>,
}

pub(crate) async fn upload_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    mut multipart: Multipart,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    let mut curriculum = None;
    let mut standards = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return error_body(err.status(), err.body_text()),
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => return error_body(err.status(), err.body_text()),
        };

        let upload = UploadedFile { file_name, bytes };
        match name.as_str() {
            "curriculum" => curriculum = Some(upload),
            "standards" => standards = Some(upload),
            _ => {}
        }
    }

    let (Some(curriculum), Some(standards)) = (curriculum, standards) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Both curriculum and standards files are required".to_string(),
        );
    };

    match run_blocking(move || service.save_uploads(curriculum, standards)).await {
        Ok(receipt) => {
            let payload = json!({
                "message": "Files uploaded successfully",
                "session_id": receipt.session_id,
                "files": {
                    "curriculum": receipt.curriculum,
                    "standards": receipt.standards,
                },
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn process_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    axum::Json(request): axum::Json<ProcessRequest>,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    let result = run_blocking(move || {
        service.start_run(
            request.session_id.as_deref().unwrap_or_default(),
            request.curriculum.as_deref().unwrap_or_default(),
            request.standards.as_deref().unwrap_or_default(),
        )
    })
    .await;

    match result {
        Ok(session_id) => {
            let payload = json!({
                "message": "Analysis started",
                "session_id": session_id,
                "status": "processing",
                "estimated_time": "2-3 minutes",
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    match service.get_status(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    match service.get_report(&SessionId(session_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn document_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    match service.report_document(&SessionId(session_id)) {
        Ok(document) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            document,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn mapping_handler<J, S>(
    State(service): State<Arc<AnalysisService<J, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    S: ArtifactStore + 'static,
{
    match service.get_mapping(&SessionId(session_id)) {
        Ok(mapping) => (StatusCode::OK, axum::Json(mapping)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Upload writes and file checks hit the disk, so they stay off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, AnalysisServiceError>
where
    F: FnOnce() -> Result<T, AnalysisServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AnalysisServiceError::Task(err.to_string()))?
}

fn error_response(err: AnalysisServiceError) -> Response {
    match err {
        AnalysisServiceError::Input(message) => error_body(StatusCode::BAD_REQUEST, message),
        AnalysisServiceError::NotFound(message) => error_body(StatusCode::NOT_FOUND, message),
        AnalysisServiceError::NotReady(ref record) => {
            let payload = json!({
                "error": err.to_string(),
                "status": record.status,
                "progress": record.progress,
                "message": record.message,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            warn!(error = %other, "analysis request failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
