use std::path::PathBuf;

/// Where a classifier model is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A file on local disk.
    Path(PathBuf),
    /// An `http://` or `https://` URL.
    Url(String),
}

impl ModelSource {
    /// Interpret `location` as a URL if it has an HTTP scheme, otherwise as a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_owned())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

/// Configuration for the model-backed engine.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model location.
    pub source: ModelSource,
    /// Side length of the square input tensor.
    pub input_size: u32,
    /// Timeout for downloading models and images, in seconds.
    pub fetch_timeout_seconds: u64,
}

impl ModelConfig {
    /// Create a new config for `source` with a 224px input and a 30s fetch timeout.
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            input_size: 224,
            fetch_timeout_seconds: 30,
        }
    }

    /// Set the input side length.
    #[must_use]
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Set the fetch timeout in seconds.
    #[must_use]
    pub fn with_fetch_timeout(mut self, seconds: u64) -> Self {
        self.fetch_timeout_seconds = seconds;
        self
    }
}
