use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use medverify_pipeline::MetricsSnapshot;
use medverify_records::VerdictCounts;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Active verdict engine.
    #[schema(example = "stochastic")]
    pub engine: String,
    /// Current pipeline counters.
    pub metrics: MetricsSnapshot,
}

/// Per-verdict totals for the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = 12)]
    pub authentic: u64,
    #[schema(example = 3)]
    pub fake: u64,
    #[schema(example = 5)]
    pub uncertain: u64,
    #[schema(example = 20)]
    pub total: u64,
}

impl From<VerdictCounts> for StatsResponse {
    fn from(counts: VerdictCounts) -> Self {
        Self {
            authentic: counts.authentic,
            fake: counts.fake,
            uncertain: counts.uncertain,
            total: counts.total(),
        }
    }
}

/// Multipart body of `POST /v1/analyses`. Repeat `file` for each image.
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub file: Vec<Vec<u8>>,
}

/// Generic error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "authentication required")]
    pub error: String,
}
