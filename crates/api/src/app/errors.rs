use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use chargebook_billing::BillingError;
use chargebook_core::{CustomerId, InvoiceId};
use chargebook_customers::CustomerError;
use chargebook_invoicing::InvoiceError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invoice_error_to_response(err: InvoiceError) -> Response {
    let message = err.to_string();
    match err {
        InvoiceError::NotFound(_) | InvoiceError::CustomerNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", message)
        }
        InvoiceError::PaidInvoiceCannotBeCancelled(_) | InvoiceError::NotResettable { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", message)
        }
        InvoiceError::StatusChanged { .. } => {
            json_error(StatusCode::CONFLICT, "status_changed", message)
        }
        InvoiceError::Invalid(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        InvoiceError::Store(_) => {
            tracing::error!(error = %message, "invoice store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn billing_error_to_response(err: BillingError) -> Response {
    match err {
        BillingError::AlreadyPaid(_) | BillingError::Cancelled(_) => {
            json_error(StatusCode::CONFLICT, "not_chargeable", err.to_string())
        }
        BillingError::Invoice(inner) => invoice_error_to_response(inner),
    }
}

pub fn customer_error_to_response(err: CustomerError) -> Response {
    let message = err.to_string();
    match err {
        CustomerError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        CustomerError::Invalid(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        CustomerError::Store(_) => {
            tracing::error!(error = %message, "customer store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn parse_invoice_id(raw: &str) -> Result<InvoiceId, Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"))
}

pub fn parse_customer_id(raw: &str) -> Result<CustomerId, Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"))
}
