use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the two persisted collections if they do not exist yet.
/// Idempotent, safe to run on every startup.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            identity     TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            tier         TEXT NOT NULL,
            credits_used INT  NOT NULL DEFAULT 0,
            credit_limit INT,
            updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_history (
            id         UUID PRIMARY KEY,
            identity   TEXT NOT NULL,
            file_name  TEXT NOT NULL,
            score      SMALLINT NOT NULL,
            result     JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analysis_history_recency \
         ON analysis_history (identity, created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
