use std::sync::Arc;

use sqlx::PgPool;

use crate::billing::ledger::PlanLedger;
use crate::matching::engine::MatchEngine;
use crate::matching::session::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Live per-identity sessions. In-memory; sessions do not survive restarts.
    pub sessions: Arc<SessionRegistry>,
    /// Pluggable collaborator. Default: ClaudeMatchEngine.
    pub engine: Arc<dyn MatchEngine>,
    /// Pluggable plan store. Default: PgPlanLedger over the plans table.
    pub ledger: Arc<dyn PlanLedger>,
}
