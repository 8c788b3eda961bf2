//! Plan Ledger — pluggable, trait-based store for per-identity plans and
//! metered usage.
//!
//! Default: `PgPlanLedger` over the `plans` table. Tests swap in an
//! in-memory ledger.
//!
//! `AppState` holds an `Arc<dyn PlanLedger>`, wired at startup.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::plan::{PlanRow, UsagePlan};

#[async_trait]
pub trait PlanLedger: Send + Sync {
    /// Returns the identity's plan, seeding the default free plan the first
    /// time an identity is seen.
    async fn get_current(&self, identity: &str) -> Result<UsagePlan, AppError>;

    /// Consumes one credit. Unmetered plans still record the usage count.
    async fn record_usage(&self, identity: &str) -> Result<(), AppError>;

    /// Moves the identity onto the unmetered pro tier and returns the
    /// updated plan. Already-used credits are kept for bookkeeping.
    async fn activate_pro(&self, identity: &str) -> Result<UsagePlan, AppError>;
}

pub struct PgPlanLedger {
    pool: PgPool,
}

impl PgPlanLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanLedger for PgPlanLedger {
    async fn get_current(&self, identity: &str) -> Result<UsagePlan, AppError> {
        let row = sqlx::query_as::<_, PlanRow>(
            "SELECT identity, display_name, tier, credits_used, credit_limit \
             FROM plans WHERE identity = $1",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.into_domain());
        }

        let seeded = UsagePlan::default_free(identity);
        sqlx::query(
            "INSERT INTO plans (identity, display_name, tier, credits_used, credit_limit) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (identity) DO NOTHING",
        )
        .bind(&seeded.identity)
        .bind(&seeded.display_name)
        .bind(seeded.tier.as_str())
        .bind(seeded.credits_used as i32)
        .bind(seeded.credit_limit.map(|l| l as i32))
        .execute(&self.pool)
        .await?;

        Ok(seeded)
    }

    async fn record_usage(&self, identity: &str) -> Result<(), AppError> {
        // Upsert so a usage racing the initial seed still lands.
        let seeded = UsagePlan::default_free(identity);
        sqlx::query(
            "INSERT INTO plans (identity, display_name, tier, credits_used, credit_limit) \
             VALUES ($1, $2, $3, 1, $4) \
             ON CONFLICT (identity) DO UPDATE \
             SET credits_used = plans.credits_used + 1, updated_at = now()",
        )
        .bind(&seeded.identity)
        .bind(&seeded.display_name)
        .bind(seeded.tier.as_str())
        .bind(seeded.credit_limit.map(|l| l as i32))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn activate_pro(&self, identity: &str) -> Result<UsagePlan, AppError> {
        let row = sqlx::query_as::<_, PlanRow>(
            "INSERT INTO plans (identity, display_name, tier, credits_used, credit_limit) \
             VALUES ($1, 'Guest', 'pro', 0, NULL) \
             ON CONFLICT (identity) DO UPDATE \
             SET tier = 'pro', credit_limit = NULL, updated_at = now() \
             RETURNING identity, display_name, tier, credits_used, credit_limit",
        )
        .bind(identity)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }
}
