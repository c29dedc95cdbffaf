use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use chargebook_customers::CustomerCreateRequest;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).patch(update_customer))
}

pub async fn list_customers(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.customers.fetch_all().await {
        Ok(customers) => Json(customers).into_response(),
        Err(e) => errors::customer_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_customer_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.customers.fetch(id).await {
        Ok(customer) => Json(customer).into_response(),
        Err(e) => errors::customer_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CustomerCreateRequest>,
) -> axum::response::Response {
    match services.customers.create(body).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::customer_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCustomerRequest>,
) -> axum::response::Response {
    let id = match errors::parse_customer_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.customers.update(body.into_update(id)).await {
        Ok(customer) => Json(customer).into_response(),
        Err(e) => errors::customer_error_to_response(e),
    }
}
