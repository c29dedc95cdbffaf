//! Infrastructure layer: Postgres, notification transports, scheduling, config.

pub mod config;
pub mod notify;
pub mod postgres;
pub mod provider;
pub mod scheduler;
pub mod seed;

pub use config::{AppConfig, ConfigError};
pub use notify::{
    EmailNotifier, LogMailTransport, MailError, MailMessage, MailTransport, NotificationConfig,
    WebhookError, WebhookNotifier,
};
pub use postgres::{PostgresCustomerStore, PostgresInvoiceStore};
pub use provider::RandomPaymentProvider;
pub use scheduler::{BillingScheduler, SchedulerConfig, SchedulerHandle};
pub use seed::{SeedOptions, SeedSummary, seed_demo_data};
