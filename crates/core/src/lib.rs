pub mod error;
pub mod image;
pub mod principal;
pub mod record;
pub mod verdict;

pub use error::CoreError;
pub use image::{ImageReference, is_image_content_type};
pub use principal::Principal;
pub use record::{AnalysisRecord, NewAnalysisRecord};
pub use verdict::{Confidence, Verdict, VerdictOutcome};
