use std::sync::Arc;

use medverify_blob::{FilesystemImageStore, ImageStore, MemoryImageStore, UploadLimits};

use crate::config::{ImagesConfig, ServerConfig};
use crate::error::ServerError;

/// Create an image store. Image URLs are minted under the server's
/// external URL so that `GET /v1/images/{id}` resolves them.
pub async fn create_image_store(
    config: &ImagesConfig,
    server: &ServerConfig,
) -> Result<Arc<dyn ImageStore>, ServerError> {
    let limits = UploadLimits {
        max_bytes: server.max_upload_bytes,
    };
    let base_url = server.external_url();

    let store: Arc<dyn ImageStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryImageStore::new(base_url).with_limits(limits)),
        "filesystem" => {
            let store = FilesystemImageStore::open(&config.path, base_url)
                .await
                .map_err(|e| ServerError::Config(format!("images filesystem: {e}")))?;
            Arc::new(store.with_limits(limits))
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported images backend: {other}"
            )));
        }
    };

    Ok(store)
}
