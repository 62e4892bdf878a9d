/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// No record exists with the given ID.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The record exists but belongs to a different owner.
    #[error("record {0} is not owned by the caller")]
    Forbidden(String),

    /// An error from the underlying storage backend.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored row could not be mapped back to a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
