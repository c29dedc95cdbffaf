//! In-memory invoice store for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use chargebook_core::{InvoiceId, StoreError, StoreResult};

use crate::invoice::{Invoice, InvoiceStatus, InvoiceUpdateRequest, NewInvoice};
use crate::store::InvoiceStore;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<InvoiceId, Invoice>,
}

/// In-memory invoice store.
///
/// Updates happen under a single write lock, which gives the per-invoice
/// atomicity `InvoiceStore::update` requires. Successful updates are counted so
/// callers can assert on write side effects.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<Inner>,
    updates: AtomicUsize,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `update` calls so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("invoice store lock poisoned")
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn fetch_by_id(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Invoice>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn fetch_by_statuses(&self, statuses: &[InvoiceStatus]) -> StoreResult<Vec<Invoice>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .rows
            .values()
            .filter(|invoice| statuses.contains(&invoice.status))
            .cloned()
            .collect())
    }

    async fn create(&self, invoice: NewInvoice) -> StoreResult<Invoice> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.next_id += 1;
        let created = Invoice {
            id: InvoiceId::new(inner.next_id),
            customer_id: invoice.customer_id,
            amount: invoice.amount,
            status: invoice.status,
            successful_charge_date: invoice.successful_charge_date,
        };
        inner.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, request: &InvoiceUpdateRequest) -> StoreResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let invoice = inner
            .rows
            .get_mut(&request.id)
            .ok_or_else(|| StoreError::missing("invoice", request.id.get()))?;
        request.apply_to(invoice);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_if_status(
        &self,
        expected: InvoiceStatus,
        request: &InvoiceUpdateRequest,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let invoice = inner
            .rows
            .get_mut(&request.id)
            .ok_or_else(|| StoreError::missing("invoice", request.id.get()))?;
        if invoice.status != expected {
            return Ok(false);
        }
        request.apply_to(invoice);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
