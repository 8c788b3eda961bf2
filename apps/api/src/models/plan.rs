use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Credits granted to a newly seen identity on the free tier.
pub const DEFAULT_FREE_CREDITS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
        }
    }

    pub fn from_str_or_free(s: &str) -> Self {
        match s {
            "pro" => PlanTier::Pro,
            _ => PlanTier::Free,
        }
    }
}

/// An identity's plan: tier plus metered usage.
///
/// `credit_limit` of `None` means unmetered; free plans carry
/// `Some(DEFAULT_FREE_CREDITS)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsagePlan {
    pub identity: String,
    pub display_name: String,
    pub tier: PlanTier,
    pub credits_used: u32,
    pub credit_limit: Option<u32>,
}

impl UsagePlan {
    /// The plan seeded for an identity never seen before.
    pub fn default_free(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            display_name: "Guest".to_string(),
            tier: PlanTier::Free,
            credits_used: 0,
            credit_limit: Some(DEFAULT_FREE_CREDITS),
        }
    }

    /// Whether another metered operation may start right now.
    pub fn has_quota(&self) -> bool {
        match self.credit_limit {
            None => true,
            Some(limit) => self.credits_used < limit,
        }
    }

    pub fn credits_remaining(&self) -> Option<u32> {
        self.credit_limit
            .map(|limit| limit.saturating_sub(self.credits_used))
    }
}

/// Row shape of the `plans` table.
#[derive(Debug, FromRow)]
pub struct PlanRow {
    pub identity: String,
    pub display_name: String,
    pub tier: String,
    pub credits_used: i32,
    pub credit_limit: Option<i32>,
}

impl PlanRow {
    pub fn into_domain(self) -> UsagePlan {
        UsagePlan {
            identity: self.identity,
            display_name: self.display_name,
            tier: PlanTier::from_str_or_free(&self.tier),
            credits_used: self.credits_used.max(0) as u32,
            credit_limit: self.credit_limit.map(|l| l.max(0) as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_free_plan_has_quota() {
        let plan = UsagePlan::default_free("user-1");
        assert_eq!(plan.tier, PlanTier::Free);
        assert_eq!(plan.credit_limit, Some(DEFAULT_FREE_CREDITS));
        assert!(plan.has_quota());
        assert_eq!(plan.credits_remaining(), Some(DEFAULT_FREE_CREDITS));
    }

    #[test]
    fn test_exhausted_free_plan_has_no_quota() {
        let mut plan = UsagePlan::default_free("user-1");
        plan.credits_used = DEFAULT_FREE_CREDITS;
        assert!(!plan.has_quota());
        assert_eq!(plan.credits_remaining(), Some(0));
    }

    #[test]
    fn test_unlimited_plan_always_has_quota() {
        let plan = UsagePlan {
            identity: "user-1".to_string(),
            display_name: "Guest".to_string(),
            tier: PlanTier::Pro,
            credits_used: 10_000,
            credit_limit: None,
        };
        assert!(plan.has_quota());
        assert_eq!(plan.credits_remaining(), None);
    }

    #[test]
    fn test_row_with_unknown_tier_falls_back_to_free() {
        let row = PlanRow {
            identity: "user-1".to_string(),
            display_name: "Guest".to_string(),
            tier: "enterprise".to_string(),
            credits_used: 2,
            credit_limit: Some(5),
        };
        let plan = row.into_domain();
        assert_eq!(plan.tier, PlanTier::Free);
        assert_eq!(plan.credits_used, 2);
    }
}
