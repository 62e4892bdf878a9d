use thiserror::Error;

/// Errors that can occur during image storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested image was not found.
    #[error("image not found: {0}")]
    NotFound(String),

    /// The image exceeds the maximum allowed size.
    #[error("image too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Maximum allowed size.
        limit: u64,
    },

    /// The upload was empty.
    #[error("image is empty")]
    Empty,

    /// The content type is not an image type.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// A storage backend error occurred.
    #[error("image storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
