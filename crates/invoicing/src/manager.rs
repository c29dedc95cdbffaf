//! Invoice manager: the single update path for invoices.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use chargebook_core::{CustomerId, DomainError, InvoiceId, StoreError};
use chargebook_customers::CustomerStore;

use crate::invoice::{Invoice, InvoiceCreateRequest, InvoiceQuery, InvoiceStatus, InvoiceUpdateRequest};
use crate::store::InvoiceStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    #[error("invoice {0} not found")]
    NotFound(InvoiceId),

    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    #[error("invoice {0} was paid and cannot be cancelled")]
    PaidInvoiceCannotBeCancelled(InvoiceId),

    #[error("invoice {id} is {status} and cannot be reset to pending")]
    NotResettable { id: InvoiceId, status: InvoiceStatus },

    #[error("invoice {id} is no longer {expected}")]
    StatusChanged { id: InvoiceId, expected: InvoiceStatus },

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for InvoiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing {
                entity: "invoice",
                id,
            } => InvoiceError::NotFound(InvoiceId::new(id)),
            other => InvoiceError::Store(other),
        }
    }
}

/// Invoice service over an [`InvoiceStore`].
///
/// Enforces the `Paid -> Canceled` ban; every other transition is allowed here
/// and further legality is up to the caller.
#[derive(Clone)]
pub struct InvoiceManager {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
}

impl InvoiceManager {
    pub fn new(invoices: Arc<dyn InvoiceStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self {
            invoices,
            customers,
        }
    }

    pub async fn fetch(&self, id: InvoiceId) -> Result<Invoice, InvoiceError> {
        self.invoices
            .fetch_by_id(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    pub async fn fetch_all(&self) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self.invoices.fetch_all().await?)
    }

    pub async fn fetch_by_query(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self.invoices.fetch_by_statuses(&query.statuses).await?)
    }

    pub async fn fetch_pending(&self) -> Result<Vec<Invoice>, InvoiceError> {
        self.fetch_by_query(&InvoiceQuery::pending()).await
    }

    pub async fn fetch_unpaid(&self) -> Result<Vec<Invoice>, InvoiceError> {
        self.fetch_by_query(&InvoiceQuery::unpaid()).await
    }

    pub async fn create(&self, request: InvoiceCreateRequest) -> Result<Invoice, InvoiceError> {
        request.validate()?;
        if self.customers.fetch_by_id(request.customer_id).await?.is_none() {
            return Err(InvoiceError::CustomerNotFound(request.customer_id));
        }
        let invoice = self.invoices.create(request.into()).await?;
        info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            amount = %invoice.amount,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Apply `request` unless it would cancel a paid invoice.
    pub async fn update(&self, request: InvoiceUpdateRequest) -> Result<(), InvoiceError> {
        let current = self.fetch(request.id).await?;
        check_transition(current.status, &request)?;
        self.invoices.update(&request).await?;
        Ok(())
    }

    /// Apply `request` only if the stored status is still `expected`.
    ///
    /// Fails with `StatusChanged` when another writer got there first.
    pub async fn update_from(
        &self,
        expected: InvoiceStatus,
        request: InvoiceUpdateRequest,
    ) -> Result<(), InvoiceError> {
        check_transition(expected, &request)?;
        if !self.invoices.update_if_status(expected, &request).await? {
            warn!(invoice_id = %request.id, %expected, "invoice changed underneath the update");
            return Err(InvoiceError::StatusChanged {
                id: request.id,
                expected,
            });
        }
        Ok(())
    }

    pub async fn cancel(&self, id: InvoiceId) -> Result<(), InvoiceError> {
        self.update(InvoiceUpdateRequest::status(id, InvoiceStatus::Canceled))
            .await?;
        info!(invoice_id = %id, "invoice cancelled");
        Ok(())
    }

    /// Return an invoice in a failure status to `Pending` so the next billing
    /// run picks it up again.
    pub async fn reset_to_pending(&self, id: InvoiceId) -> Result<(), InvoiceError> {
        let current = self.fetch(id).await?;
        if !current.status.is_unpaid() {
            return Err(InvoiceError::NotResettable {
                id,
                status: current.status,
            });
        }
        self.update(InvoiceUpdateRequest::status(id, InvoiceStatus::Pending))
            .await?;
        info!(invoice_id = %id, previous = %current.status, "invoice reset to pending");
        Ok(())
    }
}

fn check_transition(current: InvoiceStatus, request: &InvoiceUpdateRequest) -> Result<(), InvoiceError> {
    if current == InvoiceStatus::Paid && request.status == Some(InvoiceStatus::Canceled) {
        warn!(invoice_id = %request.id, "refusing to cancel a paid invoice");
        return Err(InvoiceError::PaidInvoiceCannotBeCancelled(request.id));
    }
    request.validate(current)?;
    Ok(())
}
