use std::sync::Arc;

use tracing::info;

use medverify_core::{AnalysisRecord, Principal};
use medverify_records::{HistoryQuery, RecordStore, VerdictCounts};

use crate::error::PipelineError;

/// Owner-scoped access to past analyses.
#[derive(Clone)]
pub struct HistoryService {
    records: Arc<dyn RecordStore>,
}

impl HistoryService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// The caller's records, newest first. Empty history is an empty list.
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: &HistoryQuery,
    ) -> Result<Vec<AnalysisRecord>, PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
        Ok(self.records.list_by_owner(&principal.id, query).await?)
    }

    /// One record, if the caller owns it.
    pub async fn get(
        &self,
        principal: Option<&Principal>,
        id: &str,
    ) -> Result<AnalysisRecord, PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
        let record = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_owned()))?;

        if !principal.owns(&record.owner_id) {
            return Err(PipelineError::Forbidden(id.to_owned()));
        }
        Ok(record)
    }

    /// Permanently delete one of the caller's records.
    pub async fn delete(&self, principal: Option<&Principal>, id: &str) -> Result<(), PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
        self.records.delete(id, &principal.id).await?;
        info!(record_id = %id, owner = %principal.id, "analysis deleted");
        Ok(())
    }

    /// Per-verdict counts of the caller's records.
    pub async fn stats(&self, principal: Option<&Principal>) -> Result<VerdictCounts, PipelineError> {
        let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
        Ok(self.records.count_by_verdict(&principal.id).await?)
    }
}
