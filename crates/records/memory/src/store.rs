use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use medverify_core::{AnalysisRecord, NewAnalysisRecord};
use medverify_records::{HistoryQuery, RecordError, RecordStore, VerdictCounts};

/// In-memory record store using `DashMap`. Suitable for development and testing.
///
/// Records are keyed by ID. Listings scan and sort on every call, which is
/// fine for the volumes this backend is meant for.
pub struct MemoryRecordStore {
    records: DashMap<String, AnalysisRecord>,
}

impl MemoryRecordStore {
    /// Create a new empty in-memory record store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of stored records across all owners.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, RecordError> {
        let id = uuid::Uuid::now_v7().to_string();
        let record = record.into_record(id.clone(), Utc::now());
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>, RecordError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<AnalysisRecord>, RecordError> {
        let mut matching: Vec<AnalysisRecord> = self
            .records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| query.verdict.is_none_or(|v| r.verdict == v))
            .map(|r| r.value().clone())
            .collect();

        // Newest first; v7 IDs break ties between equal timestamps.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let offset = query.effective_offset() as usize;
        let limit = query.effective_limit() as usize;
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<(), RecordError> {
        match self.records.remove_if(id, |_, r| r.owner_id == owner_id) {
            Some(_) => Ok(()),
            None if self.records.contains_key(id) => Err(RecordError::Forbidden(id.to_owned())),
            None => Err(RecordError::NotFound(id.to_owned())),
        }
    }

    async fn count_by_verdict(&self, owner_id: &str) -> Result<VerdictCounts, RecordError> {
        let mut counts = VerdictCounts::default();
        for r in self.records.iter().filter(|r| r.owner_id == owner_id) {
            counts.add(r.verdict);
        }
        Ok(counts)
    }
}
