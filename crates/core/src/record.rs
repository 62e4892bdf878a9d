use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verdict::{Confidence, Verdict, VerdictOutcome};

/// A persisted analysis result.
///
/// Records are immutable once inserted: the store assigns `id` and
/// `created_at`, and the only later operation is deletion by the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Unique record identifier (UUID v7).
    pub id: String,
    /// Principal that submitted the image.
    pub owner_id: String,
    /// Display name of the source file.
    pub image_name: String,
    /// Where the source image can be retrieved.
    pub image_url: String,
    /// Classification result.
    pub verdict: Verdict,
    /// Certainty attached to `verdict`, in `[0, 100]`.
    pub confidence_score: Confidence,
    /// Engine-generated explanation.
    pub analysis_details: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// The verdict tuple this record was built from.
    pub fn outcome(&self) -> VerdictOutcome {
        VerdictOutcome::new(
            self.verdict,
            self.confidence_score,
            self.analysis_details.clone(),
        )
    }
}

/// The fields a caller supplies when inserting a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisRecord {
    pub owner_id: String,
    pub image_name: String,
    pub image_url: String,
    /// Taken whole from one engine call.
    pub outcome: VerdictOutcome,
}

impl NewAnalysisRecord {
    pub fn new(
        owner_id: impl Into<String>,
        image_name: impl Into<String>,
        image_url: impl Into<String>,
        outcome: VerdictOutcome,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            image_name: image_name.into(),
            image_url: image_url.into(),
            outcome,
        }
    }

    /// Materialize the record with store-assigned identity and timestamp.
    pub fn into_record(self, id: impl Into<String>, created_at: DateTime<Utc>) -> AnalysisRecord {
        AnalysisRecord {
            id: id.into(),
            owner_id: self.owner_id,
            image_name: self.image_name,
            image_url: self.image_url,
            verdict: self.outcome.verdict,
            confidence_score: self.outcome.confidence,
            analysis_details: self.outcome.explanation,
            created_at,
        }
    }
}
