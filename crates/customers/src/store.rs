//! Customer persistence boundary.

use std::sync::Arc;

use async_trait::async_trait;

use chargebook_core::{CustomerId, StoreResult};

use crate::customer::{Customer, CustomerCreateRequest, CustomerUpdateRequest};

/// Storage for customers. Implementations assign ids on `create`.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn fetch_by_id(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    async fn fetch_all(&self) -> StoreResult<Vec<Customer>>;

    async fn create(&self, request: &CustomerCreateRequest) -> StoreResult<Customer>;

    /// Apply a partial update. Fails with `StoreError::Missing` if the id is unknown.
    async fn update(&self, request: &CustomerUpdateRequest) -> StoreResult<()>;
}

#[async_trait]
impl<S> CustomerStore for Arc<S>
where
    S: CustomerStore + ?Sized,
{
    async fn fetch_by_id(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        (**self).fetch_by_id(id).await
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Customer>> {
        (**self).fetch_all().await
    }

    async fn create(&self, request: &CustomerCreateRequest) -> StoreResult<Customer> {
        (**self).create(request).await
    }

    async fn update(&self, request: &CustomerUpdateRequest) -> StoreResult<()> {
        (**self).update(request).await
    }
}
