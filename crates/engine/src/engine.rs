use async_trait::async_trait;
use medverify_core::{ImageReference, VerdictOutcome};

use crate::error::EngineError;

/// A strategy that turns an image into a verdict.
///
/// The verdict, its confidence and the explanation are always produced by a
/// single call and returned together.
#[async_trait]
pub trait VerdictEngine: Send + Sync + std::fmt::Debug {
    /// Classify the referenced image.
    async fn analyze(&self, image: &ImageReference) -> Result<VerdictOutcome, EngineError>;

    /// Short strategy name used in logs and health output.
    fn name(&self) -> &'static str;
}
