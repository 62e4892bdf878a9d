use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use medverify_pipeline::PipelineError;

/// Errors that can occur when running the medverify server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline or history error surfaced through the API.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Authentication failed (invalid credentials).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline(e) => match e {
                PipelineError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                PipelineError::UploadFailure(_) | PipelineError::AnalysisFailure(_) => {
                    StatusCode::BAD_REQUEST
                }
                PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
                PipelineError::Forbidden(_) => StatusCode::FORBIDDEN,
                PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
