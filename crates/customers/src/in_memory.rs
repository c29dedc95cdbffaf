//! In-memory customer store for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use chargebook_core::{CustomerId, StoreError, StoreResult};

use crate::customer::{Customer, CustomerCreateRequest, CustomerUpdateRequest};
use crate::store::CustomerStore;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<CustomerId, Customer>,
}

/// In-memory customer store. Ids start at 1 and increase monotonically.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    inner: RwLock<Inner>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("customer store lock poisoned")
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn fetch_by_id(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Customer>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn create(&self, request: &CustomerCreateRequest) -> StoreResult<Customer> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.next_id += 1;
        let customer = Customer {
            id: CustomerId::new(inner.next_id),
            name: request.name.clone(),
            currency: request.currency,
            email: request.email.clone(),
            phone_number: request.phone_number.clone(),
        };
        inner.rows.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update(&self, request: &CustomerUpdateRequest) -> StoreResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let customer = inner
            .rows
            .get_mut(&request.id)
            .ok_or_else(|| StoreError::missing("customer", request.id.get()))?;
        request.apply_to(customer);
        Ok(())
    }
}
