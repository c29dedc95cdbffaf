use std::time::Duration;

/// Billing run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    /// Maximum number of charge attempts in flight within one batch.
    pub max_concurrent: usize,
    /// Upper bound on a single provider call; elapsing counts as a network error.
    pub charge_timeout: Option<Duration>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            charge_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl BillingConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_charge_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.charge_timeout = timeout;
        self
    }
}
