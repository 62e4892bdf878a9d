use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use medverify_core::is_image_content_type;

use crate::error::BlobError;

/// Metadata for a stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Unique image identifier.
    pub id: String,
    /// Principal that uploaded the image.
    pub owner_id: String,
    /// Original filename.
    pub filename: String,
    /// MIME content type (e.g. `"image/png"`).
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// `SHA-256` hex digest of the image content.
    pub checksum_sha256: String,
    /// Retrievable URL for the image.
    pub url: String,
    /// When the image was stored.
    pub created_at: DateTime<Utc>,
}

/// Maps image IDs to public URLs and back.
///
/// URLs have the form `{base_url}/v1/images/{id}`.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    const PATH: &'static str = "/v1/images/";

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The URL under which `id` is served.
    pub fn url_for(&self, id: &str) -> String {
        format!("{}{}{id}", self.base_url, Self::PATH)
    }

    /// Recover the image ID from a URL minted by [`url_for`](Self::url_for).
    ///
    /// Returns `None` for URLs that point elsewhere.
    pub fn id_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let id = url
            .strip_prefix(self.base_url.as_str())?
            .strip_prefix(Self::PATH)?;
        (!id.is_empty() && !id.contains('/')).then_some(id)
    }
}

/// Size and type checks applied before an image is stored.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum accepted size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl UploadLimits {
    /// Reject empty, oversized or non-image uploads.
    pub fn check(&self, content_type: &str, data: &Bytes) -> Result<(), BlobError> {
        if !is_image_content_type(content_type) {
            return Err(BlobError::InvalidContentType(content_type.to_owned()));
        }
        if data.is_empty() {
            return Err(BlobError::Empty);
        }
        let size = data.len() as u64;
        if size > self.max_bytes {
            return Err(BlobError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercase hex `SHA-256` of `data`.
pub(crate) fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
