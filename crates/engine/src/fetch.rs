use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::debug;

use medverify_blob::ImageStore;

use crate::error::EngineError;

/// Retrieves image bytes for a URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, url: &str) -> Result<Bytes, EngineError>;
}

/// Fetches images over HTTP(S) with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    ///
    /// Bodies are unbounded until [`with_max_bytes`](Self::with_max_bytes)
    /// sets a cap.
    pub fn new(timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            max_bytes: u64::MAX,
        })
    }

    /// Refuse images larger than `max_bytes`.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, url: &str) -> EngineError {
        EngineError::Fetch(format!(
            "image at {url} exceeds the {} byte limit",
            self.max_bytes
        ))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, EngineError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| EngineError::Fetch(e.to_string()))?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(self.too_large(url));
        }

        // Content-Length may be absent or wrong; count what actually arrives.
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| EngineError::Fetch(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, size = body.len(), "image fetched over http");
        Ok(body.freeze())
    }
}

/// Looks in the local image store first and falls back to another fetcher
/// for URLs the store does not own.
pub struct StoreFirstFetcher {
    store: Arc<dyn ImageStore>,
    fallback: Arc<dyn ImageFetcher>,
}

impl StoreFirstFetcher {
    pub fn new(store: Arc<dyn ImageStore>, fallback: Arc<dyn ImageFetcher>) -> Self {
        Self { store, fallback }
    }
}

impl std::fmt::Debug for StoreFirstFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFirstFetcher")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageFetcher for StoreFirstFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, EngineError> {
        match self.store.fetch_by_url(url).await {
            Ok(Some(bytes)) => return Ok(bytes),
            Ok(None) => {}
            Err(e) => return Err(EngineError::Fetch(e.to_string())),
        }
        self.fallback.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use medverify_blob::MemoryImageStore;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::mock::StaticFetcher;

    /// Serve one HTTP response with `body`, optionally without a
    /// `Content-Length` header, and return its URL.
    async fn serve_once(body: Vec<u8>, announce_length: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = if announce_length {
                format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                )
            } else {
                "HTTP/1.1 200 OK\r\ncontent-type: image/png\r\nconnection: close\r\n\r\n"
                    .to_owned()
            };
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/pack.png")
    }

    fn capped_fetcher(max_bytes: u64) -> HttpImageFetcher {
        HttpImageFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_max_bytes(max_bytes)
    }

    #[tokio::test]
    async fn http_fetch_within_limit_succeeds() {
        let url = serve_once(vec![7u8; 512], true).await;
        let bytes = capped_fetcher(1024).fetch(&url).await.unwrap();
        assert_eq!(bytes.len(), 512);
    }

    #[tokio::test]
    async fn announced_oversize_body_is_rejected() {
        let url = serve_once(vec![0u8; 64 * 1024], true).await;
        let err = capped_fetcher(1024).fetch(&url).await.unwrap_err();
        assert!(matches!(err, EngineError::Fetch(ref m) if m.contains("exceeds")), "got {err:?}");
    }

    #[tokio::test]
    async fn unannounced_oversize_body_is_cut_off() {
        let url = serve_once(vec![0u8; 64 * 1024], false).await;
        let err = capped_fetcher(1024).fetch(&url).await.unwrap_err();
        assert!(matches!(err, EngineError::Fetch(ref m) if m.contains("exceeds")), "got {err:?}");
    }

    #[tokio::test]
    async fn store_hit_skips_fallback() {
        let store = Arc::new(MemoryImageStore::new("http://localhost:8080"));
        let meta = store
            .put("u1", "a.png", "image/png", Bytes::from_static(b"local"))
            .await
            .unwrap();
        let fallback = Arc::new(StaticFetcher::new(Bytes::from_static(b"remote")));
        let fetcher = StoreFirstFetcher::new(store, fallback.clone());

        let bytes = fetcher.fetch(&meta.url).await.unwrap();
        assert_eq!(&bytes[..], b"local");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn foreign_url_uses_fallback() {
        let store = Arc::new(MemoryImageStore::new("http://localhost:8080"));
        let fallback = Arc::new(StaticFetcher::new(Bytes::from_static(b"remote")));
        let fetcher = StoreFirstFetcher::new(store, fallback.clone());

        let bytes = fetcher.fetch("https://cdn.example/x.png").await.unwrap();
        assert_eq!(&bytes[..], b"remote");
        assert_eq!(fallback.calls(), 1);
    }
}
