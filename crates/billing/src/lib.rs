//! Billing: charging invoices against a payment provider.
//!
//! - `provider`: the payment provider capability and its outcome model
//! - `service`: one charge attempt for one invoice (`BillingService`)
//! - `job`: one batch over every pending invoice (`BillingJob`)
//! - `notifier`: operator alerting for invoices left unpaid by a batch

pub mod config;
pub mod job;
pub mod notifier;
pub mod provider;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::BillingConfig;
pub use job::{BatchReport, BillingJob};
pub use notifier::{NoopNotifier, Notifier};
pub use provider::{ChargeOutcome, PaymentProvider, ProviderError};
pub use service::{BillingError, BillingService};
