//! Customer service: request validation + not-found mapping over a store.

use thiserror::Error;
use tracing::info;

use chargebook_core::{CustomerId, DomainError, StoreError};

use crate::customer::{Customer, CustomerCreateRequest, CustomerUpdateRequest};
use crate::store::CustomerStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustomerError {
    #[error("customer {0} not found")]
    NotFound(CustomerId),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CustomerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { id, .. } => CustomerError::NotFound(CustomerId::new(id)),
            other => CustomerError::Store(other),
        }
    }
}

pub struct CustomerService<S> {
    store: S,
}

impl<S: CustomerStore> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.store.fetch_all().await?)
    }

    pub async fn fetch(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        self.store
            .fetch_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))
    }

    pub async fn create(&self, request: CustomerCreateRequest) -> Result<Customer, CustomerError> {
        request.validate()?;
        let customer = self.store.create(&request).await?;
        info!(customer_id = %customer.id, currency = %customer.currency, "customer created");
        Ok(customer)
    }

    pub async fn update(&self, request: CustomerUpdateRequest) -> Result<Customer, CustomerError> {
        request.validate()?;
        self.store.update(&request).await?;
        self.fetch(request.id).await
    }
}
