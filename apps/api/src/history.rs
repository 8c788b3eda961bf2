//! Analysis history — persisted record of completed analyses, newest first.

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::history::HistoryRow;
use crate::state::AppState;

/// Upper bound on rows returned by a history listing.
pub const HISTORY_PAGE_SIZE: i64 = 50;

/// Persists one completed analysis. Returns the record id.
pub async fn record_analysis(
    pool: &PgPool,
    identity: &str,
    file_name: &str,
    result: &AnalysisResult,
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    let payload = serde_json::to_value(result).map_err(anyhow::Error::from)?;

    sqlx::query(
        "INSERT INTO analysis_history (id, identity, file_name, score, result) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(identity)
    .bind(file_name)
    .bind(result.score as i16)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Lists the identity's most recent analyses, newest first.
pub async fn list_recent(pool: &PgPool, identity: &str) -> Result<Vec<HistoryRow>, AppError> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, identity, file_name, score, result, created_at \
         FROM analysis_history \
         WHERE identity = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(identity)
    .bind(HISTORY_PAGE_SIZE)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// GET /api/v1/history/:identity
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Vec<HistoryRow>>, AppError> {
    let rows = list_recent(&state.db, &identity).await?;
    Ok(Json(rows))
}
