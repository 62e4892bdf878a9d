use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use medverify_core::{AnalysisRecord, Confidence, NewAnalysisRecord, Verdict};
use medverify_records::{HistoryQuery, RecordError, RecordStore, VerdictCounts};

use crate::config::PostgresRecordConfig;
use crate::migrations;

/// Postgres-backed record store using `sqlx`.
pub struct PostgresRecordStore {
    pool: PgPool,
    table: String,
}

impl PostgresRecordStore {
    /// Create a new store, connecting to Postgres and running migrations.
    pub async fn new(config: &PostgresRecordConfig) -> Result<Self, RecordError> {
        let pool = PgPool::connect(&config.url).await.map_err(storage)?;

        migrations::run_migrations(&pool, &config.prefix)
            .await
            .map_err(storage)?;

        Ok(Self {
            pool,
            table: config.table(),
        })
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: PgPool, prefix: &str) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool, prefix)
            .await
            .map_err(storage)?;

        Ok(Self {
            pool,
            table: format!("{prefix}analyses"),
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, RecordError> {
        let record = record.into_record(uuid::Uuid::now_v7().to_string(), Utc::now());

        let sql = format!(
            r"
            INSERT INTO {} (
                id, owner_id, image_name, image_url,
                verdict, confidence_score, analysis_details, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
            self.table
        );

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.owner_id)
            .bind(&record.image_name)
            .bind(&record.image_url)
            .bind(record.verdict.as_str())
            .bind(record.confidence_score.value())
            .bind(&record.analysis_details)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        debug!(record_id = %record.id, owner = %record.owner_id, "analysis record inserted");
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>, RecordError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table);

        let row = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<AnalysisRecord>, RecordError> {
        let limit = i64::from(query.effective_limit());
        let offset = i64::from(query.effective_offset());

        let rows: Vec<AnalysisRow> = if let Some(verdict) = query.verdict {
            let sql = format!(
                "SELECT * FROM {} WHERE owner_id = $1 AND verdict = $2 \
                 ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
                self.table
            );
            sqlx::query_as::<_, AnalysisRow>(&sql)
                .bind(owner_id)
                .bind(verdict.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
        } else {
            let sql = format!(
                "SELECT * FROM {} WHERE owner_id = $1 \
                 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                self.table
            );
            sqlx::query_as::<_, AnalysisRow>(&sql)
                .bind(owner_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
        }
        .map_err(storage)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<(), RecordError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND owner_id = $2", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists_sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", self.table);
        let exists = sqlx::query_scalar::<_, bool>(&exists_sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;

        if exists {
            Err(RecordError::Forbidden(id.to_owned()))
        } else {
            Err(RecordError::NotFound(id.to_owned()))
        }
    }

    async fn count_by_verdict(&self, owner_id: &str) -> Result<VerdictCounts, RecordError> {
        let sql = format!(
            "SELECT verdict, COUNT(*) FROM {} WHERE owner_id = $1 GROUP BY verdict",
            self.table
        );

        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        let mut counts = VerdictCounts::default();
        for (verdict, count) in rows {
            let verdict: Verdict = verdict
                .parse()
                .map_err(|e: medverify_core::CoreError| RecordError::Corrupt(e.to_string()))?;
            #[allow(clippy::cast_sign_loss)]
            let count = count as u64;
            match verdict {
                Verdict::Authentic => counts.authentic += count,
                Verdict::Fake => counts.fake += count,
                Verdict::Uncertain => counts.uncertain += count,
            }
        }
        Ok(counts)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn storage(e: sqlx::Error) -> RecordError {
    RecordError::Storage(e.to_string())
}

/// Internal row type for mapping database rows to `AnalysisRecord`.
#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: String,
    owner_id: String,
    image_name: String,
    image_url: String,
    verdict: String,
    confidence_score: f64,
    analysis_details: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = RecordError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let verdict: Verdict = row
            .verdict
            .parse()
            .map_err(|e: medverify_core::CoreError| RecordError::Corrupt(e.to_string()))?;
        let confidence_score = Confidence::new(row.confidence_score)
            .map_err(|e| RecordError::Corrupt(e.to_string()))?;

        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            image_name: row.image_name,
            image_url: row.image_url,
            verdict,
            confidence_score,
            analysis_details: row.analysis_details,
            created_at: row.created_at,
        })
    }
}
