use std::sync::Arc;
use std::time::Duration;

use medverify_blob::ImageStore;
use medverify_engine::{StochasticEngine, VerdictEngine};
#[cfg(feature = "onnx")]
use medverify_engine::{
    HttpImageFetcher, ModelConfig, ModelEngine, ModelSource, OnnxModelLoader, StoreFirstFetcher,
};

use crate::config::{EngineConfig, ServerConfig};
use crate::error::ServerError;

/// Create the verdict engine named by `[engine] strategy`.
///
/// The model strategy reads images out of `images` when their URL points
/// there and falls back to HTTP otherwise. The model itself is loaded on
/// the first analysis. Fetched images are capped at
/// `server.max_upload_bytes`, the same limit uploads get.
pub fn create_engine(
    config: &EngineConfig,
    server: &ServerConfig,
    images: &Arc<dyn ImageStore>,
) -> Result<Arc<dyn VerdictEngine>, ServerError> {
    match config.strategy.as_str() {
        "stochastic" => Ok(Arc::new(
            StochasticEngine::new()
                .with_latency(Duration::from_millis(config.simulated_latency_ms)),
        )),
        "model" => create_model_engine(config, server, images),
        other => Err(ServerError::Config(format!(
            "unsupported engine strategy: {other}"
        ))),
    }
}

#[cfg(feature = "onnx")]
fn create_model_engine(
    config: &EngineConfig,
    server: &ServerConfig,
    images: &Arc<dyn ImageStore>,
) -> Result<Arc<dyn VerdictEngine>, ServerError> {
    let location = config.model_location().ok_or_else(|| {
        ServerError::Config("model strategy requires [engine] model_path or model_url".into())
    })?;

    let model_config = ModelConfig::new(ModelSource::parse(location))
        .with_input_size(config.input_size)
        .with_fetch_timeout(config.fetch_timeout_seconds);
    let loader = OnnxModelLoader::new(&model_config)
        .map_err(|e| ServerError::Config(format!("model loader: {e}")))?;

    let http = HttpImageFetcher::new(Duration::from_secs(config.fetch_timeout_seconds))
        .map_err(|e| ServerError::Config(format!("image fetcher: {e}")))?
        .with_max_bytes(server.max_upload_bytes);
    let fetcher = StoreFirstFetcher::new(Arc::clone(images), Arc::new(http));

    Ok(Arc::new(ModelEngine::new(
        Arc::new(loader),
        Arc::new(fetcher),
        config.input_size,
    )))
}

#[cfg(not(feature = "onnx"))]
fn create_model_engine(
    _config: &EngineConfig,
    _server: &ServerConfig,
    _images: &Arc<dyn ImageStore>,
) -> Result<Arc<dyn VerdictEngine>, ServerError> {
    Err(ServerError::Config(
        "model strategy requires the `onnx` feature".into(),
    ))
}
