use async_trait::async_trait;

use medverify_core::{AnalysisRecord, NewAnalysisRecord};

use crate::error::RecordError;
use crate::query::{HistoryQuery, VerdictCounts};

/// Trait for analysis record storage backends.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
/// Records are append-only apart from owner-initiated deletion.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, assigning its ID and creation time.
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, RecordError>;

    /// Retrieve a record by ID regardless of owner.
    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>, RecordError>;

    /// List an owner's records, newest first.
    ///
    /// An owner with no records yields an empty list.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<AnalysisRecord>, RecordError>;

    /// Permanently delete a record owned by `owner_id`.
    ///
    /// Returns [`RecordError::NotFound`] if no such record exists and
    /// [`RecordError::Forbidden`] if it belongs to someone else, in which
    /// case the record is left in place.
    async fn delete(&self, id: &str, owner_id: &str) -> Result<(), RecordError>;

    /// Count an owner's records per verdict.
    async fn count_by_verdict(&self, owner_id: &str) -> Result<VerdictCounts, RecordError>;
}
