use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::PipelineState;

/// A state change of one pipeline instance, broadcast in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    pub instance_id: String,
    /// Principal the instance runs for. Used for filtering, never sent.
    #[serde(skip)]
    pub owner_id: String,
    pub image_name: String,
    pub state: PipelineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set once the record is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    /// Whether `principal_id` may see this event.
    pub fn is_visible_to(&self, principal_id: &str) -> bool {
        self.owner_id == principal_id
    }
}
