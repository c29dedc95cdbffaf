//! Demo data for local runs against the in-memory stores.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use chargebook_core::{Clock, Currency, Money, StoreResult};
use chargebook_customers::{CustomerCreateRequest, CustomerStore};
use chargebook_invoicing::{InvoiceStore, NewInvoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub customers: usize,
    pub invoices_per_customer: usize,
    /// Makes currencies and amounts reproducible.
    pub rng_seed: u64,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            customers: 100,
            invoices_per_customer: 10,
            rng_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub pending_invoices: usize,
    pub paid_invoices: usize,
}

/// Create customers with a random currency, each with one pending invoice and
/// the rest already paid at `clock.now()`. Invoices use the customer's currency.
pub async fn seed_demo_data(
    customers: &dyn CustomerStore,
    invoices: &dyn InvoiceStore,
    clock: &dyn Clock,
    options: SeedOptions,
) -> StoreResult<SeedSummary> {
    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let mut summary = SeedSummary::default();

    for n in 1..=options.customers {
        let currency = Currency::ALL[rng.random_range(0..Currency::ALL.len())];
        let customer = customers
            .create(&CustomerCreateRequest {
                name: format!("Customer {n}"),
                currency,
                email: format!("customer{n}@example.com"),
                phone_number: None,
            })
            .await?;
        summary.customers += 1;

        for i in 0..options.invoices_per_customer {
            let amount = Money::new(Decimal::new(rng.random_range(1_000..50_000), 2), currency);
            let draft = if i == 0 {
                summary.pending_invoices += 1;
                NewInvoice::pending(customer.id, amount)
            } else {
                summary.paid_invoices += 1;
                NewInvoice::paid(customer.id, amount, clock.now())
            };
            invoices.create(draft).await?;
        }
    }

    info!(
        customers = summary.customers,
        pending = summary.pending_invoices,
        paid = summary.paid_invoices,
        "demo data seeded"
    );
    Ok(summary)
}
