use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;
use crate::types::ImageMetadata;

/// Pluggable storage backend for uploaded images.
///
/// A store accepts image bytes, assigns an ID, and returns metadata carrying
/// a retrievable URL. Implementations must be `Send + Sync` to be shared
/// across pipeline instances.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image and return its metadata.
    ///
    /// The store assigns a unique ID, computes a `SHA-256` checksum and mints
    /// the URL under which the image can be fetched.
    async fn put(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<ImageMetadata, BlobError>;

    /// Retrieve an image by ID, returning both metadata and content.
    async fn get(&self, id: &str) -> Result<Option<(ImageMetadata, Bytes)>, BlobError>;

    /// Delete an image by ID. Returns `true` if the image existed.
    async fn delete(&self, id: &str) -> Result<bool, BlobError>;

    /// Map a URL back to an image ID owned by this store, if it is one.
    fn resolve_url(&self, url: &str) -> Option<String>;

    /// Fetch image bytes by URL when the URL points into this store.
    ///
    /// Returns `Ok(None)` for foreign URLs and for IDs that no longer exist.
    async fn fetch_by_url(&self, url: &str) -> Result<Option<Bytes>, BlobError> {
        let Some(id) = self.resolve_url(url) else {
            return Ok(None);
        };
        Ok(self.get(&id).await?.map(|(_, data)| data))
    }
}
