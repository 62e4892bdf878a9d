//! Test doubles for engines, classifiers, loaders and fetchers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use medverify_core::{Confidence, ImageReference, Verdict, VerdictOutcome};

use crate::engine::VerdictEngine;
use crate::error::EngineError;
use crate::fetch::ImageFetcher;
use crate::model::{Classifier, ModelLoader};
use crate::policy::explanation;
use crate::preprocess::PreparedImage;

/// A mock engine that returns a configurable outcome and counts calls.
#[derive(Debug)]
pub struct MockVerdictEngine {
    outcome: VerdictOutcome,
    calls: AtomicUsize,
}

impl MockVerdictEngine {
    /// Create a mock with a custom outcome.
    pub fn with_outcome(outcome: VerdictOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that always answers `verdict` at `confidence`.
    pub fn returning(verdict: Verdict, confidence: f64) -> Self {
        let confidence = Confidence::clamped(confidence);
        Self::with_outcome(VerdictOutcome::new(
            verdict,
            confidence,
            explanation(verdict, &confidence.to_string()),
        ))
    }

    /// Number of `analyze` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VerdictEngine for MockVerdictEngine {
    async fn analyze(&self, _image: &ImageReference) -> Result<VerdictOutcome, EngineError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.outcome.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A mock engine that always fails with an inference error.
#[derive(Debug, Clone)]
pub struct FailingVerdictEngine {
    error_message: String,
}

impl FailingVerdictEngine {
    /// Create a failing engine with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[async_trait]
impl VerdictEngine for FailingVerdictEngine {
    async fn analyze(&self, _image: &ImageReference) -> Result<VerdictOutcome, EngineError> {
        Err(EngineError::Inference(self.error_message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A classifier that ignores its input and returns fixed probabilities.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    authentic: f32,
    fake: f32,
}

impl FixedClassifier {
    pub fn new(authentic: f32, fake: f32) -> Self {
        Self { authentic, fake }
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, _input: &PreparedImage) -> Result<[f32; 2], EngineError> {
        Ok([self.authentic, self.fake])
    }
}

/// A loader that hands out a [`FixedClassifier`] and counts load attempts.
#[derive(Debug)]
pub struct CountingLoader {
    classifier: FixedClassifier,
    loads: AtomicUsize,
    fail_first: bool,
}

impl CountingLoader {
    pub fn new(classifier: FixedClassifier) -> Self {
        Self {
            classifier,
            loads: AtomicUsize::new(0),
            fail_first: false,
        }
    }

    /// A loader whose first attempt fails with [`EngineError::ModelLoad`].
    pub fn failing_first(classifier: FixedClassifier) -> Self {
        Self {
            fail_first: true,
            ..Self::new(classifier)
        }
    }

    /// Number of load attempts so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>, EngineError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to pile up on the cell.
        tokio::task::yield_now().await;
        if self.fail_first && attempt == 0 {
            return Err(EngineError::ModelLoad("model unavailable".into()));
        }
        Ok(Arc::new(self.classifier))
    }

    fn describe(&self) -> String {
        "fixed".into()
    }
}

/// A fetcher that serves the same bytes for every URL.
#[derive(Debug)]
pub struct StaticFetcher {
    bytes: Bytes,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Bytes, EngineError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_engine_counts_calls() {
        let engine = MockVerdictEngine::returning(Verdict::Fake, 91.0);
        let image = ImageReference::remote("http://localhost/a.png", "a.png");

        let outcome = engine.analyze(&image).await.unwrap();
        assert_eq!(outcome.verdict, Verdict::Fake);
        assert!(outcome.explanation.contains("91% confidence"));
        engine.analyze(&image).await.unwrap();
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn failing_engine_errors() {
        let engine = FailingVerdictEngine::new("gpu on fire");
        let image = ImageReference::remote("http://localhost/a.png", "a.png");
        let err = engine.analyze(&image).await.unwrap_err();
        assert!(err.to_string().contains("gpu on fire"));
    }
}
