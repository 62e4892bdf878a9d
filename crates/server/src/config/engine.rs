use serde::Deserialize;

/// Verdict engine configuration.
///
/// # Example
///
/// ```toml
/// [engine]
/// strategy = "model"
/// model_path = "models/packaging.onnx"
/// input_size = 224
/// ```
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// `"stochastic"` (placeholder) or `"model"` (ONNX inference).
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Artificial delay for the stochastic engine, in milliseconds.
    #[serde(default)]
    pub simulated_latency_ms: u64,
    /// Local model file. Takes precedence over `model_url`.
    pub model_path: Option<String>,
    /// Remote model location.
    pub model_url: Option<String>,
    /// Side length of the square model input.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Timeout for model and image downloads, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

impl EngineConfig {
    /// The configured model location, path first.
    pub fn model_location(&self) -> Option<&str> {
        self.model_path.as_deref().or(self.model_url.as_deref())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            simulated_latency_ms: 0,
            model_path: None,
            model_url: None,
            input_size: default_input_size(),
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

fn default_strategy() -> String {
    "stochastic".to_owned()
}

fn default_input_size() -> u32 {
    224
}

fn default_fetch_timeout() -> u64 {
    30
}
