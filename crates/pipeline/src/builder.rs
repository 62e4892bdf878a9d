use std::sync::Arc;

use tokio::sync::broadcast;

use medverify_blob::ImageStore;
use medverify_engine::VerdictEngine;
use medverify_records::RecordStore;

use crate::error::PipelineError;
use crate::metrics::PipelineMetrics;
use crate::pipeline::AnalysisPipeline;

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fluent builder for constructing an [`AnalysisPipeline`].
///
/// An image store, a record store and an engine are required. Metrics and
/// the event channel capacity have defaults.
pub struct AnalysisPipelineBuilder {
    images: Option<Arc<dyn ImageStore>>,
    records: Option<Arc<dyn RecordStore>>,
    engine: Option<Arc<dyn VerdictEngine>>,
    metrics: Option<Arc<PipelineMetrics>>,
    event_capacity: usize,
}

impl AnalysisPipelineBuilder {
    pub fn new() -> Self {
        Self {
            images: None,
            records: None,
            engine: None,
            metrics: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    #[must_use]
    pub fn images(mut self, store: Arc<dyn ImageStore>) -> Self {
        self.images = Some(store);
        self
    }

    #[must_use]
    pub fn records(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.records = Some(store);
        self
    }

    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn VerdictEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Share an existing metrics instance.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Buffer size of the event channel. Slow subscribers beyond this lag.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Result<AnalysisPipeline, PipelineError> {
        let images = self
            .images
            .ok_or_else(|| PipelineError::Internal("image store is required".into()))?;
        let records = self
            .records
            .ok_or_else(|| PipelineError::Internal("record store is required".into()))?;
        let engine = self
            .engine
            .ok_or_else(|| PipelineError::Internal("verdict engine is required".into()))?;

        let (events, _) = broadcast::channel(self.event_capacity);

        Ok(AnalysisPipeline {
            images,
            records,
            engine,
            metrics: self.metrics.unwrap_or_default(),
            events,
        })
    }
}

impl Default for AnalysisPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use medverify_blob::MemoryImageStore;
    use medverify_engine::StochasticEngine;

    use super::*;

    #[test]
    fn missing_components_are_reported() {
        let Err(err) = AnalysisPipelineBuilder::new()
            .images(Arc::new(MemoryImageStore::new("http://localhost")))
            .engine(Arc::new(StochasticEngine::new()))
            .build()
        else {
            panic!("build should fail without a record store");
        };
        assert!(err.to_string().contains("record store"));
    }
}
