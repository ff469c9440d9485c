use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use concierge_rag::{FailureKind, RagError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors that reach the HTTP boundary.
///
/// Only the fixed messages below are ever sent to the caller; the underlying
/// [`RagError`] is logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Question is required")]
    Validation,

    #[error("Internal server error")]
    Internal(#[from] RagError),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Validation => FailureKind::Validation,
            ApiError::Internal(_) => FailureKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            error!(kind = %source.kind(), error = %source, "request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_collaborator_detail() {
        let err = ApiError::from(RagError::CompletionError {
            provider: "OpenAI".into(),
            message: "invalid api key sk-live-123".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.kind().as_str(), "INTERNAL_FAILURE");
    }

    #[test]
    fn validation_is_a_client_error() {
        assert_eq!(ApiError::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Validation.kind(), FailureKind::Validation);
    }
}
