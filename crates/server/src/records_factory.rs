use std::sync::Arc;

use medverify_records::RecordStore;
use medverify_records_memory::MemoryRecordStore;
#[cfg(feature = "postgres")]
use medverify_records_postgres::{PostgresRecordConfig, PostgresRecordStore};

use crate::config::RecordsConfig;
use crate::error::ServerError;

/// Create a record store from the given configuration.
///
/// The Postgres backend connects and applies migrations before returning.
#[allow(clippy::unused_async)]
pub async fn create_record_store(
    config: &RecordsConfig,
) -> Result<Arc<dyn RecordStore>, ServerError> {
    let store: Arc<dyn RecordStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryRecordStore::new()),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.as_deref().ok_or_else(|| {
                ServerError::Config("records postgres backend requires [records] url".into())
            })?;

            let pg_config = PostgresRecordConfig::new(url).with_prefix(&config.prefix);
            let store = PostgresRecordStore::new(&pg_config)
                .await
                .map_err(|e| ServerError::Config(format!("records postgres: {e}")))?;

            Arc::new(store)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported records backend: {other}"
            )));
        }
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_is_the_default() {
        let store = create_record_store(&RecordsConfig::default()).await.unwrap();
        let counts = store.count_by_verdict("nobody").await.unwrap();
        assert_eq!(counts.total(), 0);
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let config = RecordsConfig {
            backend: "cassandra".into(),
            ..RecordsConfig::default()
        };
        let err = create_record_store(&config).await.err().unwrap();
        assert!(err.to_string().contains("cassandra"));
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn postgres_requires_url() {
        let config = RecordsConfig {
            backend: "postgres".into(),
            ..RecordsConfig::default()
        };
        let err = create_record_store(&config).await.err().unwrap();
        assert!(err.to_string().contains("[records] url"));
    }
}
