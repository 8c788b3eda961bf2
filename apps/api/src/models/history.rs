use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted analysis record, newest-first in listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub identity: String,
    pub file_name: String,
    pub score: i16,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
