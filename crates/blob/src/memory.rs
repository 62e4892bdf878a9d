use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::BlobError;
use crate::store::ImageStore;
use crate::types::{ImageMetadata, ImageUrls, UploadLimits, checksum};

/// In-memory image store using `DashMap`. Suitable for development and testing.
pub struct MemoryImageStore {
    images: DashMap<String, (ImageMetadata, Bytes)>,
    urls: ImageUrls,
    limits: UploadLimits,
}

impl MemoryImageStore {
    /// Create an empty store that mints URLs under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            images: DashMap::new(),
            urls: ImageUrls::new(base_url),
            limits: UploadLimits::default(),
        }
    }

    /// Override the upload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store holds no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<ImageMetadata, BlobError> {
        self.limits.check(content_type, &data)?;

        let id = uuid::Uuid::now_v7().to_string();
        let meta = ImageMetadata {
            url: self.urls.url_for(&id),
            id: id.clone(),
            owner_id: owner_id.to_owned(),
            filename: filename.to_owned(),
            content_type: content_type.to_owned(),
            size_bytes: data.len() as u64,
            checksum_sha256: checksum(&data),
            created_at: Utc::now(),
        };
        self.images.insert(id, (meta.clone(), data));
        Ok(meta)
    }

    async fn get(&self, id: &str) -> Result<Option<(ImageMetadata, Bytes)>, BlobError> {
        Ok(self.images.get(id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, BlobError> {
        Ok(self.images.remove(id).is_some())
    }

    fn resolve_url(&self, url: &str) -> Option<String> {
        self.urls.id_from_url(url).map(str::to_owned)
    }
}
