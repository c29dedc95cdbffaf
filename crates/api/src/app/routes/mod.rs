use axum::{routing::get, Router};

pub mod billing;
pub mod customers;
pub mod invoices;
pub mod system;

/// Router for every endpoint under `/rest`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/v1/invoices", invoices::router())
        .nest("/v1/customers", customers::router())
        .nest("/v1/billing", billing::router())
}
