use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use chargebook_core::InvoiceId;
use chargebook_invoicing::InvoiceCreateRequest;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/unpaid", get(list_unpaid_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/charge", post(charge_invoice))
        .route("/:id/cancel", post(cancel_invoice))
        .route("/:id/reset", post(reset_invoice))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListInvoicesParams>,
) -> axum::response::Response {
    let result = match params.status {
        None => services.invoices.fetch_all().await,
        Some(raw) => match dto::parse_status_filter(&raw) {
            Ok(query) => services.invoices.fetch_by_query(&query).await,
            Err(resp) => return resp,
        },
    };
    match result {
        Ok(invoices) => Json(invoices).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn list_unpaid_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.invoices.fetch_unpaid().await {
        Ok(invoices) => Json(invoices).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_invoice_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    current_invoice(&services, id).await
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<InvoiceCreateRequest>,
) -> axum::response::Response {
    match services.invoices.create(body).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

/// Charge one invoice now, outside of any batch.
pub async fn charge_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_invoice_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let invoice = match services.invoices.fetch(id).await {
        Ok(invoice) => invoice,
        Err(e) => return errors::invoice_error_to_response(e),
    };
    let paid = match services.billing.charge_invoice(&invoice).await {
        Ok(paid) => paid,
        Err(e) => return errors::billing_error_to_response(e),
    };
    match services.invoices.fetch(id).await {
        Ok(invoice) => Json(dto::ChargeResponse { paid, invoice }).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn cancel_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_invoice_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(e) = services.invoices.cancel(id).await {
        return errors::invoice_error_to_response(e);
    }
    current_invoice(&services, id).await
}

pub async fn reset_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_invoice_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(e) = services.invoices.reset_to_pending(id).await {
        return errors::invoice_error_to_response(e);
    }
    current_invoice(&services, id).await
}

async fn current_invoice(services: &AppServices, id: InvoiceId) -> axum::response::Response {
    match services.invoices.fetch(id).await {
        Ok(invoice) => Json(invoice).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}
