use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use crate::error::BlobError;
use crate::store::ImageStore;
use crate::types::{ImageMetadata, ImageUrls, UploadLimits, checksum};

/// Image store that keeps each image as a pair of files under a root
/// directory: `{id}.bin` for the content and `{id}.json` for its metadata.
pub struct FilesystemImageStore {
    root: PathBuf,
    urls: ImageUrls,
    limits: UploadLimits,
}

impl FilesystemImageStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            urls: ImageUrls::new(base_url),
            limits: UploadLimits::default(),
        })
    }

    /// Override the upload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.bin"))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// IDs are minted by this store as UUIDs; anything else is never a
    /// valid file name here.
    fn valid_id(id: &str) -> bool {
        uuid::Uuid::parse_str(id).is_ok()
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
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

        let meta_json =
            serde_json::to_vec(&meta).map_err(|e| BlobError::Storage(e.to_string()))?;
        tokio::fs::write(self.data_path(&id), &data).await?;
        tokio::fs::write(self.meta_path(&id), meta_json).await?;

        debug!(image_id = %id, size = meta.size_bytes, "image written");
        Ok(meta)
    }

    async fn get(&self, id: &str) -> Result<Option<(ImageMetadata, Bytes)>, BlobError> {
        if !Self::valid_id(id) {
            return Ok(None);
        }

        let meta_raw = match tokio::fs::read(self.meta_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: ImageMetadata =
            serde_json::from_slice(&meta_raw).map_err(|e| BlobError::Storage(e.to_string()))?;

        let data = match tokio::fs::read(self.data_path(id)).await {
            Ok(raw) => Bytes::from(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some((meta, data)))
    }

    async fn delete(&self, id: &str) -> Result<bool, BlobError> {
        if !Self::valid_id(id) {
            return Ok(false);
        }

        let existed = match tokio::fs::remove_file(self.meta_path(id)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match tokio::fs::remove_file(self.data_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    fn resolve_url(&self, url: &str) -> Option<String> {
        self.urls.id_from_url(url).map(str::to_owned)
    }
}
