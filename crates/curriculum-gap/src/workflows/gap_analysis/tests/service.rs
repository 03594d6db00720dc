use super::common::*;

use crate::workflows::gap_analysis::domain::SessionId;
use crate::workflows::gap_analysis::jobs::JobStatus;
use crate::workflows::gap_analysis::service::{AnalysisServiceError, UploadedFile};

fn upload(file_name: &str, lines: &[&str]) -> UploadedFile {
    UploadedFile {
        file_name: file_name.to_string(),
        bytes: lines.join("\n").into_bytes(),
    }
}

#[test]
fn uploads_are_stored_under_the_session_with_their_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());

    let receipt = service
        .save_uploads(
            upload("Syllabus.TXT", &["CS1", "iteration"]),
            upload("acm.txt", &["ACM", "loops"]),
        )
        .expect("uploads accepted");

    assert_eq!(receipt.session_id.as_str().len(), 8);
    assert_eq!(
        receipt.curriculum,
        format!("curriculum_{}.txt", receipt.session_id)
    );
    assert_eq!(
        receipt.standards,
        format!("standards_{}.txt", receipt.session_id)
    );
    assert!(service.upload_dir().join(&receipt.curriculum).is_file());
}

#[test]
fn disallowed_extensions_are_rejected_before_anything_is_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());

    let err = service
        .save_uploads(upload("notes.txt", &["a"]), upload("slides.pptx", &["b"]))
        .expect_err("pptx rejected");

    match err {
        AnalysisServiceError::Input(message) => {
            assert_eq!(message, "Allowed file types: pdf, docx, txt")
        }
        other => panic!("expected input error, got {other:?}"),
    }
    let written = std::fs::read_dir(service.upload_dir()).expect("upload dir").count();
    assert_eq!(written, 0);
}

#[test]
fn start_run_validates_parameters_and_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());

    assert!(matches!(
        service.start_run("", "curriculum_x.txt", "standards_x.txt"),
        Err(AnalysisServiceError::Input(_))
    ));
    assert!(matches!(
        service.start_run("x", "curriculum_x.txt", "standards_x.txt"),
        Err(AnalysisServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.start_run("x", "../Cargo.toml", "standards_x.txt"),
        Err(AnalysisServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn session_ids_that_could_leave_the_results_dir_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());
    let receipt = service
        .save_uploads(
            upload("curriculum.txt", &["CS1", "iteration"]),
            upload("standards.txt", &["ACM", "loops"]),
        )
        .expect("uploads accepted");

    for raw in ["../escaped", "nested/run", "..", " spaced "] {
        match service.start_run(raw, &receipt.curriculum, &receipt.standards) {
            Err(AnalysisServiceError::Input(message)) => {
                assert!(message.contains("session_id"), "{message}")
            }
            other => panic!("expected input error for {raw:?}, got {other:?}"),
        }
    }
    assert!(!dir.path().join("escaped_report.json").exists());

    let escaped = SessionId::from("../escaped");
    assert!(matches!(
        service.get_status(&escaped),
        Err(AnalysisServiceError::Input(_))
    ));
    assert!(matches!(
        service.get_report(&escaped),
        Err(AnalysisServiceError::Input(_))
    ));
    assert!(matches!(
        service.report_document(&escaped),
        Err(AnalysisServiceError::Input(_))
    ));
    assert!(matches!(
        service.get_mapping(&escaped),
        Err(AnalysisServiceError::Input(_))
    ));
}

#[tokio::test]
async fn started_runs_complete_in_the_background() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());
    let receipt = service
        .save_uploads(
            upload("curriculum.txt", &["CS1", "iteration", "arrays"]),
            upload("standards.txt", &["ACM", "loops", "recursion"]),
        )
        .expect("uploads accepted");

    let session_id = service
        .start_run(
            receipt.session_id.as_str(),
            &receipt.curriculum,
            &receipt.standards,
        )
        .expect("run starts");

    let record = wait_for_terminal(&service, &session_id).await;
    assert_eq!(record.status, JobStatus::Completed);

    let report = service.get_report(&session_id).expect("report ready");
    assert_eq!(report.summary.total_topics, 2);
    assert_eq!(service.get_mapping(&session_id).expect("mapping").len(), 2);
    assert!(service
        .report_document(&session_id)
        .expect("document")
        .starts_with("# Curriculum Gap Analysis Report"));
}

#[tokio::test]
async fn failed_runs_never_serve_a_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());
    let receipt = service
        .save_uploads(
            upload("curriculum.txt", &["CS1", "iteration"]),
            upload("standards.txt", &["ACM", "pointers"]),
        )
        .expect("uploads accepted");

    let session_id = service
        .start_run(
            receipt.session_id.as_str(),
            &receipt.curriculum,
            &receipt.standards,
        )
        .expect("run starts");

    let record = wait_for_terminal(&service, &session_id).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.progress, 0);
    assert!(record.message.contains("pointers"));

    match service.get_report(&session_id) {
        Err(AnalysisServiceError::NotReady(current)) => {
            assert_eq!(current.status, JobStatus::Failed)
        }
        other => panic!("expected not ready, got {other:?}"),
    }
}

#[test]
fn unknown_sessions_are_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(dir.path());
    let id = SessionId::from("missing");

    assert!(matches!(
        service.get_status(&id),
        Err(AnalysisServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.get_report(&id),
        Err(AnalysisServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.get_mapping(&id),
        Err(AnalysisServiceError::NotFound(_))
    ));
}
