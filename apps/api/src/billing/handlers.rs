use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::billing::checkout::{process_checkout, BillingCycle};
use crate::errors::AppError;
use crate::models::plan::UsagePlan;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub plan: BillingCycle,
}

#[derive(Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: UsagePlan,
    pub credits_remaining: Option<u32>,
}

impl From<UsagePlan> for PlanResponse {
    fn from(plan: UsagePlan) -> Self {
        let credits_remaining = plan.credits_remaining();
        Self {
            plan,
            credits_remaining,
        }
    }
}

/// GET /api/v1/plans/:identity
pub async fn handle_get_plan(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    let plan = state.ledger.get_current(&identity).await?;
    Ok(Json(plan.into()))
}

/// POST /api/v1/plans/:identity/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    if !process_checkout(&identity, req.plan).await {
        return Err(AppError::Validation("checkout did not complete".to_string()));
    }

    let plan = state.ledger.activate_pro(&identity).await?;
    Ok(Json(plan.into()))
}
