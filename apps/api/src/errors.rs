use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::prompt_builder::MissingInputError;
use crate::llm_client::LlmError;
use crate::resume::DocumentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error(transparent)]
    MissingInput(#[from] MissingInputError),

    #[error("Could not extract {stage} from model output")]
    Unparseable { stage: &'static str, raw: String },

    #[error("Generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Generation timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("An analysis is already running for this session")]
    AnalysisInProgress,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::ServiceUnavailable(msg) => AppError::ServiceUnavailable(msg),
            LlmError::Timeout { secs } => AppError::GenerationTimeout { secs },
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(error: DocumentError) -> Self {
        AppError::UnreadableDocument(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnreadableDocument(msg) => {
                (StatusCode::BAD_REQUEST, "UNREADABLE_DOCUMENT", msg.clone())
            }
            AppError::MissingInput(e) => {
                tracing::error!("Prompt assembly failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MISSING_INPUT",
                    e.to_string(),
                )
            }
            AppError::Unparseable { stage, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPARSEABLE_OUTPUT",
                format!(
                    "Automatic extraction of {stage} failed: the model reply contained no JSON document. The raw reply is included."
                ),
            ),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Generation service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "The local text-generation service is not reachable".to_string(),
                )
            }
            AppError::GenerationTimeout { secs } => {
                tracing::error!("Generation timed out after {secs}s");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "GENERATION_TIMEOUT",
                    format!("The model did not answer within {secs} seconds"),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::AnalysisInProgress => (
                StatusCode::CONFLICT,
                "ANALYSIS_IN_PROGRESS",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Unparseable { raw, .. } = &self {
            error["raw"] = json!(raw);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_llm_timeout_maps_to_generation_timeout() {
        let err = AppError::from(LlmError::Timeout { secs: 30 });
        assert!(matches!(err, AppError::GenerationTimeout { secs: 30 }));
    }

    #[test]
    fn test_llm_unavailable_maps_to_service_unavailable() {
        let err = AppError::from(LlmError::ServiceUnavailable("refused".into()));
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unparseable_response_carries_raw_text() {
        let response = AppError::Unparseable {
            stage: "job_details",
            raw: "I cannot provide that information.".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNPARSEABLE_OUTPUT");
        assert_eq!(body["error"]["raw"], "I cannot provide that information.");
    }

    #[tokio::test]
    async fn test_validation_response_shape() {
        let response = AppError::Validation("job_description cannot be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"].get("raw").is_none());
    }
}
