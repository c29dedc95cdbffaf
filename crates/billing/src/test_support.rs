//! Hand-written fakes shared by the billing tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use chargebook_core::{Currency, CustomerId, FixedClock, InvoiceId, Money, StoreError, StoreResult};
use chargebook_customers::InMemoryCustomerStore;
use chargebook_invoicing::{
    InMemoryInvoiceStore, Invoice, InvoiceManager, InvoiceStatus, InvoiceStore,
    InvoiceUpdateRequest, NewInvoice,
};

use crate::config::BillingConfig;
use crate::notifier::Notifier;
use crate::provider::{PaymentProvider, ProviderError};
use crate::service::BillingService;

/// What the scripted provider does for one invoice.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(Result<bool, ProviderError>),
    /// Never answers within any reasonable timeout.
    Hang,
}

/// Provider that answers per invoice id and records every call.
/// Invoices without a script are authorized.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<InvoiceId, Script>>,
    calls: Mutex<Vec<InvoiceId>>,
}

impl ScriptedProvider {
    pub fn script(&self, id: InvoiceId, script: Script) {
        self.scripts.lock().unwrap().insert(id, script);
    }

    pub fn reply(&self, id: InvoiceId, reply: Result<bool, ProviderError>) {
        self.script(id, Script::Reply(reply));
    }

    pub fn calls(&self) -> Vec<InvoiceId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
        self.calls.lock().unwrap().push(invoice.id);
        let script = self.scripts.lock().unwrap().get(&invoice.id).cloned();
        match script {
            None => Ok(true),
            Some(Script::Reply(reply)) => reply,
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(true)
            }
        }
    }
}

/// Notifier that records each alert.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Vec<InvoiceId>>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<Vec<InvoiceId>> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, failed: &[InvoiceId]) {
        self.alerts.lock().unwrap().push(failed.to_vec());
    }
}

/// Store whose writes can be made to fail for chosen invoices.
#[derive(Debug)]
pub struct BreakableStore {
    inner: Arc<InMemoryInvoiceStore>,
    broken: Mutex<HashSet<InvoiceId>>,
}

#[async_trait]
impl InvoiceStore for BreakableStore {
    async fn fetch_by_id(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.inner.fetch_by_id(id).await
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Invoice>> {
        self.inner.fetch_all().await
    }

    async fn fetch_by_statuses(&self, statuses: &[InvoiceStatus]) -> StoreResult<Vec<Invoice>> {
        self.inner.fetch_by_statuses(statuses).await
    }

    async fn create(&self, invoice: NewInvoice) -> StoreResult<Invoice> {
        self.inner.create(invoice).await
    }

    async fn update(&self, request: &InvoiceUpdateRequest) -> StoreResult<()> {
        if self.broken.lock().unwrap().contains(&request.id) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.update(request).await
    }

    async fn update_if_status(
        &self,
        expected: InvoiceStatus,
        request: &InvoiceUpdateRequest,
    ) -> StoreResult<bool> {
        if self.broken.lock().unwrap().contains(&request.id) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.update_if_status(expected, request).await
    }
}

pub fn charge_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

pub struct Harness {
    pub store: Arc<InMemoryInvoiceStore>,
    breakable: Arc<BreakableStore>,
    pub provider: Arc<ScriptedProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub manager: InvoiceManager,
    pub service: Arc<BillingService>,
}

impl Harness {
    pub fn new(config: &BillingConfig) -> Self {
        let store = Arc::new(InMemoryInvoiceStore::new());
        let breakable = Arc::new(BreakableStore {
            inner: store.clone(),
            broken: Mutex::new(HashSet::new()),
        });
        let customers = Arc::new(InMemoryCustomerStore::new());
        let provider = Arc::new(ScriptedProvider::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = InvoiceManager::new(breakable.clone(), customers);
        let service = Arc::new(
            BillingService::new(
                provider.clone(),
                manager.clone(),
                Arc::new(FixedClock::new(charge_time())),
            )
            .with_charge_timeout(config.charge_timeout),
        );
        Self {
            store,
            breakable,
            provider,
            notifier,
            manager,
            service,
        }
    }

    pub async fn invoice(&self, status: InvoiceStatus) -> Invoice {
        let amount = Money::new(Decimal::new(2500, 2), Currency::Eur);
        let draft = if status == InvoiceStatus::Paid {
            NewInvoice::paid(CustomerId::new(1), amount, charge_time())
        } else {
            NewInvoice {
                status,
                ..NewInvoice::pending(CustomerId::new(1), amount)
            }
        };
        self.store.create(draft).await.unwrap()
    }

    /// Make every later write for `id` fail.
    pub fn break_updates_for(&self, id: InvoiceId) {
        self.breakable.broken.lock().unwrap().insert(id);
    }

    pub async fn reload(&self, id: InvoiceId) -> Invoice {
        self.manager.fetch(id).await.unwrap()
    }
}
