//! Billing batch: charge every pending invoice once, then alert on failures.
//!
//! ## Concurrency
//!
//! A batch assumes it is the only one running. Each charge re-reads the invoice
//! and writes its result only if the status is unchanged, so a late writer can
//! never overwrite a payment. Two batches that read the same invoice at the same
//! moment can still both reach the provider; callers that trigger `run_once` on a
//! schedule must not start a tick before the previous one has finished (see the
//! infra scheduler).

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use chargebook_core::InvoiceId;
use chargebook_invoicing::InvoiceManager;

use crate::config::BillingConfig;
use crate::notifier::Notifier;
use crate::service::{BillingError, BillingService};

/// Summary of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    /// Pending invoices picked up by the batch.
    pub attempted: usize,
    pub charged: usize,
    /// Invoices the provider did not charge (the alert payload).
    pub failed: Vec<InvoiceId>,
    /// Invoices whose attempt raised an error (e.g. the result could not be stored).
    pub errored: Vec<InvoiceId>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.errored.is_empty()
    }
}

/// Batch driver, fully wired at construction.
pub struct BillingJob {
    service: Arc<BillingService>,
    invoices: InvoiceManager,
    notifier: Arc<dyn Notifier>,
    config: BillingConfig,
}

impl BillingJob {
    pub fn new(
        service: Arc<BillingService>,
        invoices: InvoiceManager,
        notifier: Arc<dyn Notifier>,
        config: BillingConfig,
    ) -> Self {
        Self {
            service,
            invoices,
            notifier,
            config,
        }
    }

    /// Run one batch.
    ///
    /// Only a failure to list pending invoices is returned; per-invoice errors
    /// are logged, reported in `errored`, and never stop the batch.
    pub async fn run_once(&self) -> Result<BatchReport, BillingError> {
        let run_id = Uuid::now_v7();
        info!(%run_id, "billing run started");

        let pending = self.invoices.fetch_pending().await?;
        let attempted = pending.len();

        let service = &self.service;
        let results: Vec<(InvoiceId, Result<bool, BillingError>)> = stream::iter(pending)
            .map(|invoice| async move {
                let result = service.charge_invoice(&invoice).await;
                (invoice.id, result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut charged = 0;
        let mut failed = Vec::new();
        let mut errored = Vec::new();
        for (id, result) in results {
            match result {
                Ok(true) => charged += 1,
                Ok(false) => failed.push(id),
                Err(err) => {
                    error!(%run_id, invoice_id = %id, error = %err, "charge attempt errored");
                    errored.push(id);
                }
            }
        }
        failed.sort();
        errored.sort();

        if !failed.is_empty() {
            self.notifier.notify(&failed).await;
        }

        let report = BatchReport {
            run_id,
            attempted,
            charged,
            failed,
            errored,
        };
        info!(
            %run_id,
            attempted = report.attempted,
            charged = report.charged,
            failed = report.failed.len(),
            errored = report.errored.len(),
            "billing run finished"
        );
        Ok(report)
    }
}
