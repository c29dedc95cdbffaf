//! Payment provider abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use chargebook_core::{Currency, CustomerId};
use chargebook_invoicing::{Invoice, InvoiceStatus};

/// Typed failure from a charge attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("customer {0} is unknown to the payment provider")]
    CustomerNotFound(CustomerId),

    #[error("invoice currency {invoice} does not match the customer account currency")]
    CurrencyMismatch { invoice: Currency },

    #[error("network error: {0}")]
    Network(String),

    #[error("payment provider error: {0}")]
    Other(String),
}

/// External payment processor.
///
/// `Ok(true)` means the charge was authorized, `Ok(false)` that it was declined
/// (the account does not hold enough funds).
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError>;
}

#[async_trait]
impl<P> PaymentProvider for Arc<P>
where
    P: PaymentProvider + ?Sized,
{
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
        (**self).charge(invoice).await
    }
}

/// Everything a charge attempt can end in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Charged,
    Declined,
    Rejected(ProviderError),
}

impl ChargeOutcome {
    /// Status to persist for this outcome.
    pub fn status(&self) -> InvoiceStatus {
        match self {
            ChargeOutcome::Charged => InvoiceStatus::Paid,
            ChargeOutcome::Declined => InvoiceStatus::UnpaidLowAccountBalance,
            ChargeOutcome::Rejected(err) => match err {
                ProviderError::CustomerNotFound(_) => InvoiceStatus::UnpaidCustomerNotExists,
                ProviderError::CurrencyMismatch { .. } => InvoiceStatus::UnpaidMismatchCurrency,
                ProviderError::Network(_) => InvoiceStatus::UnpaidNetworkError,
                ProviderError::Other(_) => InvoiceStatus::UnpaidError,
            },
        }
    }

    pub fn is_charged(&self) -> bool {
        matches!(self, ChargeOutcome::Charged)
    }
}

impl From<Result<bool, ProviderError>> for ChargeOutcome {
    fn from(result: Result<bool, ProviderError>) -> Self {
        match result {
            Ok(true) => ChargeOutcome::Charged,
            Ok(false) => ChargeOutcome::Declined,
            Err(err) => ChargeOutcome::Rejected(err),
        }
    }
}
