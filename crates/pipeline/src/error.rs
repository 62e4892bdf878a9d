use thiserror::Error;

use medverify_blob::BlobError;
use medverify_engine::EngineError;
use medverify_records::RecordError;

/// Errors surfaced by the pipeline and history service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No authenticated principal was supplied.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The image could not be stored.
    #[error("upload failed: {0}")]
    UploadFailure(String),

    /// The engine failed or the result could not be persisted.
    #[error("analysis failed: {0}")]
    AnalysisFailure(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record belongs to another principal.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BlobError> for PipelineError {
    fn from(e: BlobError) -> Self {
        Self::UploadFailure(e.to_string())
    }
}

impl From<EngineError> for PipelineError {
    fn from(e: EngineError) -> Self {
        Self::AnalysisFailure(e.to_string())
    }
}

impl From<RecordError> for PipelineError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::NotFound(id) => Self::NotFound(id),
            RecordError::Forbidden(id) => Self::Forbidden(id),
            other @ (RecordError::Storage(_) | RecordError::Corrupt(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_map_to_taxonomy() {
        let e: PipelineError = BlobError::Empty.into();
        assert!(matches!(e, PipelineError::UploadFailure(_)));

        let e: PipelineError = EngineError::Decode("bad png".into()).into();
        assert_eq!(e, PipelineError::AnalysisFailure("image decode failed: bad png".into()));

        let e: PipelineError = RecordError::Forbidden("r1".into()).into();
        assert_eq!(e, PipelineError::Forbidden("r1".into()));

        let e: PipelineError = RecordError::Storage("pool closed".into()).into();
        assert!(matches!(e, PipelineError::Internal(_)));
    }
}
