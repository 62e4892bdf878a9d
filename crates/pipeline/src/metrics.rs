use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use medverify_core::Verdict;

/// Atomic counters tracking pipeline outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Image instances started.
    pub submitted: AtomicU64,
    /// Non-image files dropped before an instance was created.
    pub rejected_non_images: AtomicU64,
    /// Instances that failed while storing the image.
    pub uploads_failed: AtomicU64,
    /// Instances that failed during analysis or persistence.
    pub analyses_failed: AtomicU64,
    /// Instances that produced a record.
    pub completed: AtomicU64,
    pub authentic: AtomicU64,
    pub fake: AtomicU64,
    pub uncertain: AtomicU64,
}

impl PipelineMetrics {
    pub fn increment_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_non_images(&self, count: u64) {
        self.rejected_non_images.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_uploads_failed(&self) {
        self.uploads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_analyses_failed(&self) {
        self.analyses_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a completed instance and its verdict.
    pub fn record_completed(&self, verdict: Verdict) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        let counter = match verdict {
            Verdict::Authentic => &self.authentic,
            Verdict::Fake => &self.fake,
            Verdict::Uncertain => &self.uncertain,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected_non_images: self.rejected_non_images.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            analyses_failed: self.analyses_failed.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            authentic: self.authentic.load(Ordering::Relaxed),
            fake: self.fake.load(Ordering::Relaxed),
            uncertain: self.uncertain.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`PipelineMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub rejected_non_images: u64,
    pub uploads_failed: u64,
    pub analyses_failed: u64,
    pub completed: u64,
    pub authentic: u64,
    pub fake: u64,
    pub uncertain: u64,
}

impl MetricsSnapshot {
    /// Instances started but not yet in a terminal state.
    pub fn in_flight(&self) -> u64 {
        self.submitted
            .saturating_sub(self.uploads_failed + self.analyses_failed + self.completed)
    }
}
