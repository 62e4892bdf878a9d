use thiserror::Error;

/// Errors that can occur while producing a verdict.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The image bytes could not be retrieved.
    #[error("image fetch failed: {0}")]
    Fetch(String),

    /// The bytes are not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The classifier could not be loaded.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The forward pass failed or produced unusable output.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
