use serde::{Deserialize, Serialize};

use medverify_core::Verdict;

/// Pagination and filters for a history listing.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct HistoryQuery {
    /// Only records with this verdict.
    pub verdict: Option<Verdict>,
    /// Maximum number of records to return (default 50, max 500).
    pub limit: Option<u32>,
    /// Number of records to skip.
    pub offset: Option<u32>,
}

impl HistoryQuery {
    /// Return the effective limit, clamped to 1..=500, defaulting to 50.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }

    /// Return the effective offset, defaulting to 0.
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// Per-verdict record counts for one owner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerdictCounts {
    pub authentic: u64,
    pub fake: u64,
    pub uncertain: u64,
}

impl VerdictCounts {
    /// Count one more record with `verdict`.
    pub fn add(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Authentic => self.authentic += 1,
            Verdict::Fake => self.fake += 1,
            Verdict::Uncertain => self.uncertain += 1,
        }
    }

    /// Total across all verdicts.
    pub fn total(&self) -> u64 {
        self.authentic + self.fake + self.uncertain
    }
}
