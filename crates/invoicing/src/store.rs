//! Invoice persistence boundary.

use std::sync::Arc;

use async_trait::async_trait;

use chargebook_core::{InvoiceId, StoreResult};

use crate::invoice::{Invoice, InvoiceStatus, InvoiceUpdateRequest, NewInvoice};

/// Storage for invoices.
///
/// `update` must be atomic per invoice id: a concurrent reader sees either the
/// whole update or none of it.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn fetch_by_id(&self, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    async fn fetch_all(&self) -> StoreResult<Vec<Invoice>>;

    /// Invoices whose status is any of `statuses`. Order is unspecified.
    async fn fetch_by_statuses(&self, statuses: &[InvoiceStatus]) -> StoreResult<Vec<Invoice>>;

    async fn create(&self, invoice: NewInvoice) -> StoreResult<Invoice>;

    /// Fails with `StoreError::Missing` if the id is unknown.
    async fn update(&self, request: &InvoiceUpdateRequest) -> StoreResult<()>;

    /// Like `update`, but only while the stored status is still `expected`.
    ///
    /// Returns `Ok(false)` and writes nothing when the status has moved on.
    async fn update_if_status(
        &self,
        expected: InvoiceStatus,
        request: &InvoiceUpdateRequest,
    ) -> StoreResult<bool>;
}

#[async_trait]
impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    async fn fetch_by_id(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        (**self).fetch_by_id(id).await
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Invoice>> {
        (**self).fetch_all().await
    }

    async fn fetch_by_statuses(&self, statuses: &[InvoiceStatus]) -> StoreResult<Vec<Invoice>> {
        (**self).fetch_by_statuses(statuses).await
    }

    async fn create(&self, invoice: NewInvoice) -> StoreResult<Invoice> {
        (**self).create(invoice).await
    }

    async fn update(&self, request: &InvoiceUpdateRequest) -> StoreResult<()> {
        (**self).update(request).await
    }

    async fn update_if_status(
        &self,
        expected: InvoiceStatus,
        request: &InvoiceUpdateRequest,
    ) -> StoreResult<bool> {
        (**self).update_if_status(expected, request).await
    }
}
