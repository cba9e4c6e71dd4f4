//! Axum route handlers for the analysis API.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::pipeline::{AnalysisInput, AnalysisReport, StageOutcome};
use crate::models::analysis::{CoverLetter, JobDetails};
use crate::resume::extract_text;
use crate::session::{ANONYMOUS_SESSION, SESSION_HEADER};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobDetailsRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub resume_text: String,
    pub characters: usize,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterDownloadRequest {
    pub cover_letter: String,
}

#[derive(Debug, Default)]
struct AnalyzeForm {
    job_description: Option<String>,
    resume: Option<Bytes>,
    substitute_default_job_details: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Multipart form: `job_description` (text), `resume` (PDF file) and optionally
/// `substitute_default_job_details=true`. Runs all three stages.
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let session = session_id(&headers);
    let _ticket = state
        .guard
        .try_begin(&session)
        .ok_or(AppError::AnalysisInProgress)?;

    let form = read_analyze_form(multipart).await?;

    let job_description = form
        .job_description
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| AppError::Validation("job_description cannot be empty".to_string()))?;
    let resume = form
        .resume
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("a resume PDF must be uploaded".to_string()))?;

    let resume_text = extract_text(resume).await?;
    info!(session = %session, resume_chars = resume_text.len(), "Resume extracted");

    let report = state
        .pipeline
        .run(AnalysisInput {
            job_description,
            resume_text,
            substitute_default_job_details: form.substitute_default_job_details,
        })
        .await?;

    Ok(Json(report))
}

/// POST /api/v1/job-details
///
/// Runs only the extraction stage. Useful for previewing what the model picks up.
pub async fn handle_job_details(
    State(state): State<AppState>,
    Json(request): Json<JobDetailsRequest>,
) -> Result<Json<StageOutcome<JobDetails>>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    match state
        .pipeline
        .extract_job_details(&request.job_description)
        .await?
    {
        StageOutcome::Unparseable { raw, .. } => Err(AppError::Unparseable {
            stage: "job_details",
            raw,
        }),
        outcome => Ok(Json(outcome)),
    }
}

/// POST /api/v1/resume/extract
///
/// Multipart form with a `resume` PDF. Returns the extracted text.
pub async fn handle_extract_resume(
    mut multipart: Multipart,
) -> Result<Json<ResumeTextResponse>, AppError> {
    let mut resume: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        if field.name() == Some("resume") {
            resume = Some(field.bytes().await.map_err(invalid_multipart)?);
        }
    }

    let resume = resume
        .ok_or_else(|| AppError::Validation("a resume PDF must be uploaded".to_string()))?;
    let resume_text = extract_text(resume).await?;

    Ok(Json(ResumeTextResponse {
        characters: resume_text.chars().count(),
        resume_text,
    }))
}

/// POST /api/v1/cover-letter/download
///
/// Returns the (possibly user-edited) cover letter as a plain-text attachment.
pub async fn handle_download_cover_letter(
    Json(request): Json<CoverLetterDownloadRequest>,
) -> Result<Response, AppError> {
    let letter = CoverLetter::new(request.cover_letter)
        .ok_or_else(|| AppError::Validation("cover_letter cannot be empty".to_string()))?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        CoverLetter::FILE_NAME
    ))
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        letter.as_str().to_string(),
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}

async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                form.job_description = Some(field.text().await.map_err(invalid_multipart)?);
            }
            "resume" => {
                form.resume = Some(field.bytes().await.map_err(invalid_multipart)?);
            }
            "substitute_default_job_details" => {
                let value = field.text().await.map_err(invalid_multipart)?;
                form.substitute_default_job_details = parse_flag(&value);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("invalid multipart body: {e}"))
}
