use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use medverify_blob::ImageStore;
use medverify_core::{
    AnalysisRecord, ImageReference, NewAnalysisRecord, Principal, is_image_content_type,
};
use medverify_engine::VerdictEngine;
use medverify_records::RecordStore;

use crate::error::PipelineError;
use crate::events::PipelineEvent;
use crate::metrics::PipelineMetrics;
use crate::state::PipelineState;

/// One file handed to [`AnalysisPipeline::submit_batch`].
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Final report for one pipeline instance.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InstanceReport {
    pub instance_id: String,
    pub image_name: String,
    /// Terminal state: `complete` or `failed`.
    pub state: PipelineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AnalysisRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every state the instance passed through, in order.
    #[serde(skip)]
    pub transitions: Vec<PipelineState>,
    #[serde(skip)]
    pub failure: Option<PipelineError>,
}

impl InstanceReport {
    /// The record on success, or the failure that stopped the instance.
    pub fn into_result(self) -> Result<AnalysisRecord, PipelineError> {
        match (self.record, self.failure) {
            (Some(record), _) => Ok(record),
            (None, Some(failure)) => Err(failure),
            (None, None) => Err(PipelineError::Internal(format!(
                "instance {} ended without a result",
                self.instance_id
            ))),
        }
    }
}

/// What an instance starts from.
enum Source {
    /// Raw bytes that still need to be stored.
    Fresh(Upload),
    /// An image that already has a URL.
    Stored(ImageReference),
}

impl Source {
    fn name(&self) -> &str {
        match self {
            Self::Fresh(u) => &u.filename,
            Self::Stored(r) => &r.name,
        }
    }
}

/// Tracks one instance's state and broadcasts every transition.
struct Instance<'a> {
    id: String,
    owner_id: String,
    image_name: String,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    events: &'a broadcast::Sender<PipelineEvent>,
}

impl<'a> Instance<'a> {
    fn start(
        owner_id: &str,
        image_name: &str,
        events: &'a broadcast::Sender<PipelineEvent>,
    ) -> Self {
        let instance = Self {
            id: uuid::Uuid::now_v7().to_string(),
            owner_id: owner_id.to_owned(),
            image_name: image_name.to_owned(),
            state: PipelineState::Pending,
            transitions: vec![PipelineState::Pending],
            events,
        };
        instance.emit(None, None);
        instance
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        self.state = next;
        self.transitions.push(next);
        self.emit(None, None);
    }

    fn complete(mut self, record: AnalysisRecord) -> InstanceReport {
        self.state = PipelineState::Complete;
        self.transitions.push(PipelineState::Complete);
        self.emit(None, Some(record.id.clone()));
        InstanceReport {
            instance_id: self.id,
            image_name: self.image_name,
            state: self.state,
            record: Some(record),
            error: None,
            transitions: self.transitions,
            failure: None,
        }
    }

    fn fail(mut self, failure: PipelineError) -> InstanceReport {
        self.state = PipelineState::Failed;
        self.transitions.push(PipelineState::Failed);
        let message = failure.to_string();
        self.emit(Some(message.clone()), None);
        InstanceReport {
            instance_id: self.id,
            image_name: self.image_name,
            state: self.state,
            record: None,
            error: Some(message),
            transitions: self.transitions,
            failure: Some(failure),
        }
    }

    fn emit(&self, error: Option<String>, record_id: Option<String>) {
        // No subscribers is fine.
        let _ = self.events.send(PipelineEvent {
            instance_id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            image_name: self.image_name.clone(),
            state: self.state,
            error,
            record_id,
            timestamp: Utc::now(),
        });
    }
}

/// Runs images through upload, analysis and persistence.
///
/// Each image is an independent instance. Instances in a batch run
/// concurrently and a failure in one never affects the others.
pub struct AnalysisPipeline {
    pub(crate) images: Arc<dyn ImageStore>,
    pub(crate) records: Arc<dyn RecordStore>,
    pub(crate) engine: Arc<dyn VerdictEngine>,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) events: broadcast::Sender<PipelineEvent>,
}

impl AnalysisPipeline {
    /// Start a builder.
    pub fn builder() -> crate::builder::AnalysisPipelineBuilder {
        crate::builder::AnalysisPipelineBuilder::new()
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Subscribe to state change events for every instance.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// The engine in use.
    pub fn engine(&self) -> &Arc<dyn VerdictEngine> {
        &self.engine
    }

    /// The image store in use.
    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    /// The record store in use.
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Run every image in `uploads` as its own instance.
    ///
    /// Files whose content type is not `image/*` are dropped before any
    /// instance exists. Reports come back in submission order.
    pub async fn submit_batch(
        &self,
        principal: Option<&Principal>,
        uploads: Vec<Upload>,
    ) -> Result<Vec<InstanceReport>, PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;

        let (images, rejected): (Vec<Upload>, Vec<Upload>) = uploads
            .into_iter()
            .partition(|u| is_image_content_type(&u.content_type));

        if !rejected.is_empty() {
            debug!(
                owner = %principal.id,
                count = rejected.len(),
                "dropping non-image files"
            );
            self.metrics
                .increment_rejected_non_images(rejected.len() as u64);
        }

        let runs = images
            .into_iter()
            .map(|upload| self.run(&principal.id, Source::Fresh(upload)));
        Ok(futures::future::join_all(runs).await)
    }

    /// Analyze an image that has already been uploaded and persist the result.
    pub async fn analyze_stored(
        &self,
        principal: Option<&Principal>,
        image: ImageReference,
    ) -> Result<AnalysisRecord, PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
        self.run(&principal.id, Source::Stored(image))
            .await
            .into_result()
    }

    async fn run(&self, owner_id: &str, source: Source) -> InstanceReport {
        let mut instance = Instance::start(owner_id, source.name(), &self.events);
        self.metrics.increment_submitted();

        instance.advance(PipelineState::Uploading);
        let reference = match source {
            Source::Stored(reference) => reference,
            Source::Fresh(upload) => match self
                .images
                .put(
                    owner_id,
                    &upload.filename,
                    &upload.content_type,
                    upload.data.clone(),
                )
                .await
            {
                Ok(meta) => ImageReference::remote(meta.url, upload.filename)
                    .with_content_type(upload.content_type)
                    .with_data(upload.data),
                Err(e) => {
                    warn!(instance_id = %instance.id, error = %e, "image upload failed");
                    self.metrics.increment_uploads_failed();
                    return instance.fail(e.into());
                }
            },
        };

        instance.advance(PipelineState::Analyzing);
        let outcome = match self.engine.analyze(&reference).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    instance_id = %instance.id,
                    engine = self.engine.name(),
                    error = %e,
                    "analysis failed"
                );
                self.metrics.increment_analyses_failed();
                return instance.fail(e.into());
            }
        };

        let new = NewAnalysisRecord::new(owner_id, &reference.name, &reference.url, outcome);
        match self.records.insert(new).await {
            Ok(record) => {
                info!(
                    instance_id = %instance.id,
                    record_id = %record.id,
                    verdict = %record.verdict,
                    confidence = record.confidence_score.value(),
                    "analysis complete"
                );
                self.metrics.record_completed(record.verdict);
                instance.complete(record)
            }
            Err(e) => {
                warn!(instance_id = %instance.id, error = %e, "failed to persist analysis");
                self.metrics.increment_analyses_failed();
                instance.fail(PipelineError::AnalysisFailure(e.to_string()))
            }
        }
    }
}
