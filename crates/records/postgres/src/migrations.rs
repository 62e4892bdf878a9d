use sqlx::PgPool;

/// Create the analyses table and its indexes if they do not already exist.
pub async fn run_migrations(pool: &PgPool, prefix: &str) -> Result<(), sqlx::Error> {
    let table = format!("{prefix}analyses");

    let create_table = format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id               TEXT PRIMARY KEY,
            owner_id         TEXT NOT NULL,
            image_name       TEXT NOT NULL,
            image_url        TEXT NOT NULL,
            verdict          TEXT NOT NULL,
            confidence_score DOUBLE PRECISION NOT NULL
                CHECK (confidence_score >= 0 AND confidence_score <= 100),
            analysis_details TEXT NOT NULL,
            created_at       TIMESTAMPTZ NOT NULL
        )
        "
    );

    sqlx::query(&create_table).execute(pool).await?;

    let indexes = [
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}analyses_owner_time ON {table} (owner_id, created_at DESC)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}analyses_owner_verdict ON {table} (owner_id, verdict)"
        ),
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    Ok(())
}
