use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use chargebook_core::{Currency, CustomerId};
use chargebook_customers::CustomerUpdateRequest;
use chargebook_invoicing::{Invoice, InvoiceQuery, InvoiceStatus};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesParams {
    /// Comma-separated statuses, e.g. `PENDING,UNPAID_ERROR`.
    pub status: Option<String>,
}

/// PATCH body; the id comes from the path.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub currency: Option<Currency>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn into_update(self, id: CustomerId) -> CustomerUpdateRequest {
        CustomerUpdateRequest {
            id,
            name: self.name,
            currency: self.currency,
            email: self.email,
            phone_number: self.phone_number,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    pub paid: bool,
    pub invoice: Invoice,
}

pub fn parse_status_filter(raw: &str) -> Result<InvoiceQuery, Response> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_ascii_uppercase().parse::<InvoiceStatus>() {
            Ok(status) => statuses.push(status),
            Err(err) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    err.to_string(),
                ));
            }
        }
    }
    if statuses.is_empty() {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status filter names no status",
        ));
    }
    Ok(InvoiceQuery { statuses })
}
