pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod mock;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod policy;
pub mod preprocess;
pub mod stochastic;

pub use config::{ModelConfig, ModelSource};
pub use engine::VerdictEngine;
pub use error::EngineError;
pub use fetch::{HttpImageFetcher, ImageFetcher, StoreFirstFetcher};
pub use mock::{FailingVerdictEngine, MockVerdictEngine};
pub use model::{Classifier, ModelEngine, ModelLoader};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxModelLoader};
pub use policy::ClassScores;
pub use preprocess::PreparedImage;
pub use stochastic::StochasticEngine;
