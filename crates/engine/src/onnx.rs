use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tract_onnx::prelude::*;
use tracing::debug;

use crate::config::{ModelConfig, ModelSource};
use crate::error::EngineError;
use crate::model::{Classifier, ModelLoader};
use crate::preprocess::PreparedImage;

type Plan = TypedRunnableModel<TypedModel>;

/// An ONNX classifier optimised and planned by `tract`.
pub struct OnnxClassifier {
    plan: Plan,
    input_size: u32,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Parse and optimise an ONNX model expecting an NHWC `[1, size, size, 3]` input.
    pub fn from_bytes(model: &[u8], input_size: u32) -> Result<Self, EngineError> {
        let side = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(model))
            .and_then(|m| m.with_input_fact(0, f32::fact([1, side, side, 3]).into()))
            .and_then(tract_onnx::prelude::InferenceModelExt::into_optimized)
            .and_then(TypedModel::into_runnable)
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
        Ok(Self { plan, input_size })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: &PreparedImage) -> Result<[f32; 2], EngineError> {
        if input.size != self.input_size {
            return Err(EngineError::Inference(format!(
                "input is {}px but the model expects {}px",
                input.size, self.input_size
            )));
        }

        let tensor: Tensor = tract_ndarray::Array4::from_shape_vec(input.shape(), input.data.clone())
            .map_err(|e| EngineError::Inference(e.to_string()))?
            .into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| EngineError::Inference("model produced no outputs".into()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        let mut values = view.iter().copied();
        match (values.next(), values.next()) {
            (Some(authentic), Some(fake)) => Ok([authentic, fake]),
            _ => Err(EngineError::Inference(
                "model output has fewer than two classes".into(),
            )),
        }
    }
}

/// Loads an ONNX model from disk or over HTTP.
#[derive(Debug)]
pub struct OnnxModelLoader {
    source: ModelSource,
    input_size: u32,
    client: reqwest::Client,
}

impl OnnxModelLoader {
    pub fn new(config: &ModelConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        Ok(Self {
            source: config.source.clone(),
            input_size: config.input_size,
            client,
        })
    }

    async fn read_model(&self) -> Result<Vec<u8>, EngineError> {
        match &self.source {
            ModelSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| EngineError::ModelLoad(format!("{}: {e}", path.display()))),
            ModelSource::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
                Ok(body.to_vec())
            }
        }
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>, EngineError> {
        let bytes = self.read_model().await?;
        debug!(source = %self.source, size = bytes.len(), "model bytes read");

        let input_size = self.input_size;
        let classifier =
            tokio::task::spawn_blocking(move || OnnxClassifier::from_bytes(&bytes, input_size))
                .await
                .map_err(|e| EngineError::ModelLoad(format!("model build task failed: {e}")))??;
        Ok(Arc::new(classifier))
    }

    fn describe(&self) -> String {
        self.source.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let config = ModelConfig::new(ModelSource::Path("/nonexistent/medverify.onnx".into()));
        let loader = OnnxModelLoader::new(&config).unwrap();
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(_)));
    }

    #[test]
    fn garbage_model_is_a_load_error() {
        let err = OnnxClassifier::from_bytes(b"not protobuf", 8).unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(_)));
    }
}
