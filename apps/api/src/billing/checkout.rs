use serde::Deserialize;
use tracing::info;

/// Simulated gateway round-trip latency.
pub const SIMULATED_GATEWAY_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Annual => "annual",
        }
    }
}

/// Simulates a payment gateway checkout and reports whether it cleared.
///
/// TODO: replace with a real payment provider integration once one is chosen.
pub async fn process_checkout(identity: &str, cycle: BillingCycle) -> bool {
    info!("Processing {} checkout for {}", cycle.as_str(), identity);
    tokio::time::sleep(std::time::Duration::from_millis(SIMULATED_GATEWAY_DELAY_MS)).await;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_checkout_clears() {
        assert!(process_checkout("user-1", BillingCycle::Monthly).await);
    }

    #[test]
    fn test_billing_cycle_parses_lowercase() {
        let cycle: BillingCycle = serde_json::from_str("\"annual\"").expect("should parse");
        assert_eq!(cycle, BillingCycle::Annual);
    }
}
