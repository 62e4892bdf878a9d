pub mod error;
pub mod query;
pub mod store;
pub mod testing;

pub use error::RecordError;
pub use query::{HistoryQuery, VerdictCounts};
pub use store::RecordStore;
