//! Simulated payment provider for local runs.

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use chargebook_billing::{PaymentProvider, ProviderError};
use chargebook_invoicing::Invoice;

/// Authorizes each charge with a fixed probability. Not a real processor.
#[derive(Debug, Clone, Copy)]
pub struct RandomPaymentProvider {
    success_rate: f64,
}

impl RandomPaymentProvider {
    /// `success_rate` is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for RandomPaymentProvider {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[async_trait]
impl PaymentProvider for RandomPaymentProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
        let authorized = rand::rng().random_bool(self.success_rate);
        debug!(invoice_id = %invoice.id, authorized, "simulated charge");
        Ok(authorized)
    }
}
