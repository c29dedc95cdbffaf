//! Charging a single invoice.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use chargebook_core::{Clock, InvoiceId};
use chargebook_invoicing::{Invoice, InvoiceError, InvoiceManager, InvoiceStatus, InvoiceUpdateRequest};

use crate::provider::{ChargeOutcome, PaymentProvider, ProviderError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("invoice {0} was already paid")]
    AlreadyPaid(InvoiceId),

    #[error("invoice {0} was cancelled and cannot be charged")]
    Cancelled(InvoiceId),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

/// Charges invoices and records the outcome.
///
/// Provider failures never escape: each outcome is persisted as a status and the
/// caller only learns whether the invoice ended up `Paid`. The only errors
/// returned are precondition violations and failures writing the result.
pub struct BillingService {
    provider: Arc<dyn PaymentProvider>,
    invoices: InvoiceManager,
    clock: Arc<dyn Clock>,
    charge_timeout: Option<Duration>,
}

impl BillingService {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        invoices: InvoiceManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            invoices,
            clock,
            charge_timeout: None,
        }
    }

    pub fn with_charge_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.charge_timeout = timeout;
        self
    }

    /// Attempt to charge `invoice`. Returns `true` iff it is now paid.
    ///
    /// Paid and cancelled invoices are rejected before the provider is called
    /// and nothing is written. The snapshot is checked against the store first,
    /// and the result is only written if the stored status has not moved since;
    /// otherwise the call fails with `InvoiceError::StatusChanged`.
    pub async fn charge_invoice(&self, invoice: &Invoice) -> Result<bool, BillingError> {
        info!(invoice_id = %invoice.id, status = %invoice.status, "charging invoice");
        ensure_chargeable(invoice)?;

        let current = self.invoices.fetch(invoice.id).await?;
        ensure_chargeable(&current)?;
        if current.status != invoice.status {
            warn!(
                invoice_id = %invoice.id,
                expected = %invoice.status,
                actual = %current.status,
                "stale invoice snapshot, not charging"
            );
            return Err(InvoiceError::StatusChanged {
                id: invoice.id,
                expected: invoice.status,
            }
            .into());
        }

        let outcome = self.attempt(&current).await;
        let status = outcome.status();
        log_outcome(&current, &outcome);

        let request = match outcome {
            ChargeOutcome::Charged => InvoiceUpdateRequest::paid(current.id, self.clock.now()),
            _ => InvoiceUpdateRequest::status(current.id, status),
        };
        self.invoices.update_from(current.status, request).await?;

        Ok(status == InvoiceStatus::Paid)
    }

    async fn attempt(&self, invoice: &Invoice) -> ChargeOutcome {
        let call = self.provider.charge(invoice);
        let result = match self.charge_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Network(format!(
                    "no answer from payment provider within {}ms",
                    limit.as_millis()
                ))),
            },
            None => call.await,
        };
        ChargeOutcome::from(result)
    }
}

fn ensure_chargeable(invoice: &Invoice) -> Result<(), BillingError> {
    match invoice.status {
        InvoiceStatus::Paid => {
            error!(invoice_id = %invoice.id, "invoice was paid and cannot be charged again");
            Err(BillingError::AlreadyPaid(invoice.id))
        }
        InvoiceStatus::Canceled => {
            error!(invoice_id = %invoice.id, "invoice was cancelled and cannot be charged");
            Err(BillingError::Cancelled(invoice.id))
        }
        _ => Ok(()),
    }
}

fn log_outcome(invoice: &Invoice, outcome: &ChargeOutcome) {
    match outcome {
        ChargeOutcome::Charged => {
            info!(invoice_id = %invoice.id, amount = %invoice.amount, "invoice charged");
        }
        ChargeOutcome::Declined => warn!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            "charge declined: insufficient account balance"
        ),
        ChargeOutcome::Rejected(err) => warn!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            error = %err,
            "charge failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillingConfig;
    use crate::test_support::{Harness, Script, charge_time};
    use chargebook_core::{Currency, CustomerId, FixedClock};

    fn harness() -> Harness {
        Harness::new(&BillingConfig::default())
    }

    #[tokio::test]
    async fn paid_invoice_is_rejected_without_side_effects() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Paid).await;

        let err = h.service.charge_invoice(&invoice).await.unwrap_err();

        assert_eq!(err, BillingError::AlreadyPaid(invoice.id));
        assert!(h.provider.calls().is_empty());
        assert_eq!(h.store.update_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_invoice_is_rejected_without_side_effects() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Canceled).await;

        let err = h.service.charge_invoice(&invoice).await.unwrap_err();

        assert_eq!(err, BillingError::Cancelled(invoice.id));
        assert!(h.provider.calls().is_empty());
        assert_eq!(h.store.update_count(), 0);
    }

    #[tokio::test]
    async fn authorized_charge_marks_paid_and_stamps_the_clock_time() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Pending).await;
        h.provider.reply(invoice.id, Ok(true));

        assert!(h.service.charge_invoice(&invoice).await.unwrap());

        let stored = h.reload(invoice.id).await;
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.successful_charge_date, Some(charge_time()));
        assert_eq!(h.store.update_count(), 1);
    }

    async fn assert_failure_maps_to(reply: Result<bool, ProviderError>, expected: InvoiceStatus) {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Pending).await;
        h.provider.reply(invoice.id, reply);

        assert!(!h.service.charge_invoice(&invoice).await.unwrap());

        let stored = h.reload(invoice.id).await;
        assert_eq!(stored.status, expected);
        assert_eq!(stored.successful_charge_date, None);
        assert_eq!(h.store.update_count(), 1);
    }

    #[tokio::test]
    async fn declined_charge_is_low_account_balance() {
        assert_failure_maps_to(Ok(false), InvoiceStatus::UnpaidLowAccountBalance).await;
    }

    #[tokio::test]
    async fn unknown_customer_is_customer_not_exists() {
        assert_failure_maps_to(
            Err(ProviderError::CustomerNotFound(CustomerId::new(1))),
            InvoiceStatus::UnpaidCustomerNotExists,
        )
        .await;
    }

    #[tokio::test]
    async fn currency_mismatch_is_mismatch_currency() {
        assert_failure_maps_to(
            Err(ProviderError::CurrencyMismatch {
                invoice: Currency::Eur,
            }),
            InvoiceStatus::UnpaidMismatchCurrency,
        )
        .await;
    }

    #[tokio::test]
    async fn network_failure_is_network_error() {
        assert_failure_maps_to(
            Err(ProviderError::Network("connection refused".to_string())),
            InvoiceStatus::UnpaidNetworkError,
        )
        .await;
    }

    #[tokio::test]
    async fn unclassified_failure_is_generic_error() {
        assert_failure_maps_to(
            Err(ProviderError::Other("unexpected".to_string())),
            InvoiceStatus::UnpaidError,
        )
        .await;
    }

    #[tokio::test]
    async fn previously_failed_invoice_can_be_retried() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::UnpaidNetworkError).await;

        assert!(h.service.charge_invoice(&invoice).await.unwrap());
        assert_eq!(h.reload(invoice.id).await.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn second_charge_of_a_paid_invoice_is_rejected_and_changes_nothing() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Pending).await;
        assert!(h.service.charge_invoice(&invoice).await.unwrap());

        let now_paid = h.reload(invoice.id).await;
        let err = h.service.charge_invoice(&now_paid).await.unwrap_err();

        assert_eq!(err, BillingError::AlreadyPaid(invoice.id));
        assert_eq!(h.reload(invoice.id).await, now_paid);
        assert_eq!(h.provider.calls(), vec![invoice.id]);
        assert_eq!(h.store.update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_timeout_is_recorded_as_network_error() {
        let config =
            BillingConfig::default().with_charge_timeout(Some(std::time::Duration::from_secs(5)));
        let h = Harness::new(&config);
        let invoice = h.invoice(InvoiceStatus::Pending).await;
        h.provider.script(invoice.id, Script::Hang);

        assert!(!h.service.charge_invoice(&invoice).await.unwrap());
        assert_eq!(
            h.reload(invoice.id).await.status,
            InvoiceStatus::UnpaidNetworkError
        );
    }

    #[tokio::test]
    async fn invoice_missing_from_the_store_is_not_found_and_never_charged() {
        let h = harness();
        let mut ghost = h.invoice(InvoiceStatus::Pending).await;
        ghost.id = InvoiceId::new(999);

        let err = h.service.charge_invoice(&ghost).await.unwrap_err();

        assert_eq!(err, BillingError::Invoice(InvoiceError::NotFound(ghost.id)));
        assert!(h.provider.calls().is_empty());
        assert_eq!(h.store.update_count(), 0);
    }

    #[tokio::test]
    async fn stale_pending_snapshot_of_a_paid_invoice_is_not_charged_again() {
        let h = harness();
        let snapshot = h.invoice(InvoiceStatus::Pending).await;
        assert!(h.service.charge_invoice(&snapshot).await.unwrap());
        h.provider.reply(snapshot.id, Ok(false));

        let err = h.service.charge_invoice(&snapshot).await.unwrap_err();

        assert_eq!(err, BillingError::AlreadyPaid(snapshot.id));
        assert_eq!(h.provider.calls(), vec![snapshot.id]);
        let stored = h.reload(snapshot.id).await;
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.successful_charge_date, Some(charge_time()));
    }

    #[tokio::test]
    async fn snapshot_behind_a_failed_attempt_is_not_charged() {
        let h = harness();
        let snapshot = h.invoice(InvoiceStatus::Pending).await;
        h.manager
            .update(InvoiceUpdateRequest::status(snapshot.id, InvoiceStatus::UnpaidError))
            .await
            .unwrap();

        let err = h.service.charge_invoice(&snapshot).await.unwrap_err();

        assert_eq!(
            err,
            BillingError::Invoice(InvoiceError::StatusChanged {
                id: snapshot.id,
                expected: InvoiceStatus::Pending
            })
        );
        assert!(h.provider.calls().is_empty());
    }

    /// Provider that settles the invoice through another path while the charge
    /// is in flight, then declines.
    struct SettledElsewhere {
        invoices: InvoiceManager,
    }

    #[async_trait::async_trait]
    impl PaymentProvider for SettledElsewhere {
        async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
            self.invoices
                .update(InvoiceUpdateRequest::paid(invoice.id, charge_time()))
                .await
                .unwrap();
            Ok(false)
        }
    }

    #[tokio::test]
    async fn result_is_not_written_over_a_concurrent_payment() {
        let h = harness();
        let invoice = h.invoice(InvoiceStatus::Pending).await;
        let service = BillingService::new(
            Arc::new(SettledElsewhere {
                invoices: h.manager.clone(),
            }),
            h.manager.clone(),
            Arc::new(FixedClock::new(charge_time())),
        );

        let err = service.charge_invoice(&invoice).await.unwrap_err();

        assert_eq!(
            err,
            BillingError::Invoice(InvoiceError::StatusChanged {
                id: invoice.id,
                expected: InvoiceStatus::Pending
            })
        );
        let stored = h.reload(invoice.id).await;
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.successful_charge_date, Some(charge_time()));
        assert_eq!(h.store.update_count(), 1);
    }
}
