//! Operator alerting for invoices a billing run could not charge.

use std::sync::Arc;

use async_trait::async_trait;

use chargebook_core::InvoiceId;

/// Sends one alert per batch listing the invoices left unpaid.
///
/// Implementations are best effort: transport failures are logged by the
/// implementation and never returned to the billing run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, failed: &[InvoiceId]);
}

#[async_trait]
impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    async fn notify(&self, failed: &[InvoiceId]) {
        (**self).notify(failed).await
    }
}

/// Notifier that drops every alert.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, failed: &[InvoiceId]) {
        tracing::debug!(count = failed.len(), "notification disabled; dropping alert");
    }
}
