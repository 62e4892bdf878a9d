use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use medverify_core::{ImageReference, VerdictOutcome};

use crate::engine::VerdictEngine;
use crate::error::EngineError;
use crate::fetch::ImageFetcher;
use crate::policy::ClassScores;
use crate::preprocess::{self, PreparedImage};

/// A loaded two-class classifier.
///
/// `classify` is CPU bound and is always called from a blocking task.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Run one forward pass, returning `[authentic, fake]` probabilities.
    fn classify(&self, input: &PreparedImage) -> Result<[f32; 2], EngineError>;
}

/// Produces a classifier on first use.
#[async_trait]
pub trait ModelLoader: Send + Sync + std::fmt::Debug {
    async fn load(&self) -> Result<Arc<dyn Classifier>, EngineError>;

    /// Human-readable model location for logs.
    fn describe(&self) -> String;
}

/// Engine backed by a real classifier.
///
/// The classifier is loaded lazily on the first analysis and cached for the
/// life of the engine. Concurrent first calls share a single load.
#[derive(Debug)]
pub struct ModelEngine {
    loader: Arc<dyn ModelLoader>,
    classifier: OnceCell<Arc<dyn Classifier>>,
    fetcher: Arc<dyn ImageFetcher>,
    input_size: u32,
}

impl ModelEngine {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        fetcher: Arc<dyn ImageFetcher>,
        input_size: u32,
    ) -> Self {
        Self {
            loader,
            classifier: OnceCell::new(),
            fetcher,
            input_size,
        }
    }

    /// Whether the classifier has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.classifier.initialized()
    }

    async fn classifier(&self) -> Result<Arc<dyn Classifier>, EngineError> {
        let classifier = self
            .classifier
            .get_or_try_init(|| async {
                let model = self.loader.describe();
                info!(%model, "loading classifier");
                let loaded = self.loader.load().await?;
                info!(%model, "classifier ready");
                Ok::<_, EngineError>(loaded)
            })
            .await?;
        Ok(Arc::clone(classifier))
    }

    async fn image_bytes(&self, image: &ImageReference) -> Result<Bytes, EngineError> {
        match &image.data {
            Some(data) => Ok(data.clone()),
            None => self.fetcher.fetch(&image.url).await,
        }
    }
}

#[async_trait]
impl VerdictEngine for ModelEngine {
    async fn analyze(&self, image: &ImageReference) -> Result<VerdictOutcome, EngineError> {
        let bytes = self.image_bytes(image).await?;
        let classifier = self.classifier().await?;
        let size = self.input_size;

        let [authentic, fake] = tokio::task::spawn_blocking(move || {
            let prepared = preprocess::prepare(&bytes, size)?;
            classifier.classify(&prepared)
        })
        .await
        .map_err(|e| EngineError::Inference(format!("inference task failed: {e}")))??;

        let scores = ClassScores::from_probabilities(authentic, fake);
        debug!(
            image = %image.name,
            authentic = scores.authentic,
            fake = scores.fake,
            "model scores"
        );
        Ok(scores.outcome())
    }

    fn name(&self) -> &'static str {
        "model"
    }
}
