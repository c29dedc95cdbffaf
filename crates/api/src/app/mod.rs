//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, provider, notifier and the services built on them
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs that do not map 1:1 onto domain types
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, Stores, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .nest("/rest", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
