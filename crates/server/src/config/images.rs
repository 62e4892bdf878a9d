use serde::Deserialize;

/// Image store backend configuration.
#[derive(Debug, Deserialize)]
pub struct ImagesConfig {
    /// Which backend to use: `"memory"` or `"filesystem"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_path() -> String {
    "data/images".to_owned()
}
