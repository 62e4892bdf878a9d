pub mod error;
pub mod filesystem;
pub mod memory;
pub mod store;
pub mod types;

pub use error::BlobError;
pub use filesystem::FilesystemImageStore;
pub use memory::MemoryImageStore;
pub use store::ImageStore;
pub use types::{ImageMetadata, ImageUrls, UploadLimits};
