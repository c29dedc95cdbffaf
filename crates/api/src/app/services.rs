use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use chargebook_billing::{BillingConfig, BillingJob, BillingService, Notifier, PaymentProvider};
use chargebook_core::{Clock, SystemClock};
use chargebook_customers::{CustomerService, CustomerStore, InMemoryCustomerStore};
use chargebook_infra::postgres::{connect, migrate};
use chargebook_infra::{
    AppConfig, EmailNotifier, LogMailTransport, PostgresCustomerStore, PostgresInvoiceStore,
    RandomPaymentProvider, SeedOptions, WebhookNotifier, seed_demo_data,
};
use chargebook_invoicing::{InMemoryInvoiceStore, InvoiceManager, InvoiceStore};

/// Persistence backends shared by every service.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn CustomerStore>,
    pub invoices: Arc<dyn InvoiceStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            customers: Arc::new(InMemoryCustomerStore::new()),
            invoices: Arc::new(InMemoryInvoiceStore::new()),
        }
    }
}

/// Everything the handlers need, wired once at startup.
pub struct AppServices {
    pub customers: CustomerService<Arc<dyn CustomerStore>>,
    pub invoices: InvoiceManager,
    pub billing: Arc<BillingService>,
    pub job: Arc<BillingJob>,
}

impl AppServices {
    pub fn new(
        stores: Stores,
        provider: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &BillingConfig,
    ) -> Self {
        let invoices = InvoiceManager::new(stores.invoices, stores.customers.clone());
        let billing = Arc::new(
            BillingService::new(provider, invoices.clone(), clock)
                .with_charge_timeout(config.charge_timeout),
        );
        let job = Arc::new(BillingJob::new(
            billing.clone(),
            invoices.clone(),
            notifier,
            config.clone(),
        ));
        Self {
            customers: CustomerService::new(stores.customers),
            invoices,
            billing,
            job,
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise in-memory stores seeded with demo data.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = match &config.database_url {
        Some(url) => {
            let pool = connect(url).await.context("connecting to postgres")?;
            migrate(&pool).await.context("creating schema")?;
            info!("using postgres stores");
            let customers: Arc<dyn CustomerStore> = Arc::new(PostgresCustomerStore::new(pool.clone()));
            let invoices: Arc<dyn InvoiceStore> = Arc::new(PostgresInvoiceStore::new(pool));
            Stores {
                customers,
                invoices,
            }
        }
        None => {
            info!("DATABASE_URL not set; using in-memory stores with demo data");
            let stores = Stores::in_memory();
            seed_demo_data(
                stores.customers.as_ref(),
                stores.invoices.as_ref(),
                clock.as_ref(),
                SeedOptions::default(),
            )
            .await
            .context("seeding demo data")?;
            stores
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => Arc::new(
            WebhookNotifier::new(url.clone(), config.webhook_timeout)
                .context("building webhook client")?,
        ),
        None => Arc::new(EmailNotifier::new(
            LogMailTransport,
            config.notification.clone(),
            clock.clone(),
        )),
    };
    let provider = Arc::new(RandomPaymentProvider::new(config.provider_success_rate));

    Ok(AppServices::new(
        stores,
        provider,
        notifier,
        clock,
        &config.billing,
    ))
}
