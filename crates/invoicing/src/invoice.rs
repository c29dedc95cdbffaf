use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chargebook_core::{CustomerId, DomainError, DomainResult, InvoiceId, Money};

/// Invoice status lifecycle.
///
/// `Pending` is the only status the billing run selects. The `Unpaid*` variants
/// record why the last charge attempt failed and stay put until someone resets
/// the invoice to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Canceled,
    UnpaidCustomerNotExists,
    UnpaidLowAccountBalance,
    UnpaidMismatchCurrency,
    UnpaidNetworkError,
    UnpaidError,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 8] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Canceled,
        InvoiceStatus::UnpaidCustomerNotExists,
        InvoiceStatus::UnpaidLowAccountBalance,
        InvoiceStatus::UnpaidMismatchCurrency,
        InvoiceStatus::UnpaidNetworkError,
        InvoiceStatus::UnpaidError,
    ];

    /// Failure statuses left behind by an unsuccessful charge.
    pub const UNPAID: [InvoiceStatus; 5] = [
        InvoiceStatus::UnpaidCustomerNotExists,
        InvoiceStatus::UnpaidLowAccountBalance,
        InvoiceStatus::UnpaidMismatchCurrency,
        InvoiceStatus::UnpaidNetworkError,
        InvoiceStatus::UnpaidError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Canceled => "CANCELED",
            InvoiceStatus::UnpaidCustomerNotExists => "UNPAID_CUSTOMER_NOT_EXISTS",
            InvoiceStatus::UnpaidLowAccountBalance => "UNPAID_LOW_ACCOUNT_BALANCE",
            InvoiceStatus::UnpaidMismatchCurrency => "UNPAID_MISMATCH_CURRENCY",
            InvoiceStatus::UnpaidNetworkError => "UNPAID_NETWORK_ERROR",
            InvoiceStatus::UnpaidError => "UNPAID_ERROR",
        }
    }

    /// Anything but `Paid` and `Canceled` may be charged.
    pub fn is_chargeable(&self) -> bool {
        !matches!(self, InvoiceStatus::Paid | InvoiceStatus::Canceled)
    }

    pub fn is_unpaid(&self) -> bool {
        Self::UNPAID.contains(self)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown invoice status: {s}")))
    }
}

/// Snapshot of a persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: InvoiceStatus,
    /// Set only when a charge succeeded.
    pub successful_charge_date: Option<DateTime<Utc>>,
}

/// Request: create a pending invoice for an existing customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreateRequest {
    pub customer_id: CustomerId,
    pub amount: Money,
}

impl InvoiceCreateRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.amount.is_positive() {
            return Err(DomainError::validation("invoice amount must be positive"));
        }
        Ok(())
    }
}

/// Row handed to the store on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: InvoiceStatus,
    pub successful_charge_date: Option<DateTime<Utc>>,
}

impl NewInvoice {
    pub fn pending(customer_id: CustomerId, amount: Money) -> Self {
        Self {
            customer_id,
            amount,
            status: InvoiceStatus::Pending,
            successful_charge_date: None,
        }
    }

    /// An invoice that was settled outside the billing run (imports, seeding).
    pub fn paid(customer_id: CustomerId, amount: Money, charged_at: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            amount,
            status: InvoiceStatus::Paid,
            successful_charge_date: Some(charged_at),
        }
    }
}

impl From<InvoiceCreateRequest> for NewInvoice {
    fn from(request: InvoiceCreateRequest) -> Self {
        NewInvoice::pending(request.customer_id, request.amount)
    }
}

/// Request: change an invoice. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceUpdateRequest {
    pub id: InvoiceId,
    pub status: Option<InvoiceStatus>,
    pub successful_charge_date: Option<DateTime<Utc>>,
}

impl InvoiceUpdateRequest {
    pub fn status(id: InvoiceId, status: InvoiceStatus) -> Self {
        Self {
            id,
            status: Some(status),
            successful_charge_date: None,
        }
    }

    pub fn paid(id: InvoiceId, charged_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: Some(InvoiceStatus::Paid),
            successful_charge_date: Some(charged_at),
        }
    }

    /// Moving an invoice to `Paid` must say when it was charged.
    pub fn validate(&self, current: InvoiceStatus) -> DomainResult<()> {
        if self.status == Some(InvoiceStatus::Paid)
            && current != InvoiceStatus::Paid
            && self.successful_charge_date.is_none()
        {
            return Err(DomainError::validation(
                "marking an invoice paid requires a charge date",
            ));
        }
        Ok(())
    }

    /// Apply the present fields onto `invoice`.
    ///
    /// Leaving `Paid` drops the charge date; an invoice carries one only while paid.
    pub fn apply_to(&self, invoice: &mut Invoice) {
        if let Some(status) = self.status {
            invoice.status = status;
        }
        if invoice.status != InvoiceStatus::Paid {
            invoice.successful_charge_date = None;
        } else if let Some(date) = self.successful_charge_date {
            invoice.successful_charge_date = Some(date);
        }
    }
}

/// Status filter for invoice listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceQuery {
    pub statuses: Vec<InvoiceStatus>,
}

impl InvoiceQuery {
    pub fn pending() -> Self {
        Self {
            statuses: vec![InvoiceStatus::Pending],
        }
    }

    pub fn unpaid() -> Self {
        Self {
            statuses: InvoiceStatus::UNPAID.to_vec(),
        }
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.statuses.contains(&invoice.status)
    }
}
