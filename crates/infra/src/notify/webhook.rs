//! Webhook alerts for failed charges.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use chargebook_billing::Notifier;
use chargebook_core::InvoiceId;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook endpoint answered {0}")]
    Status(StatusCode),
}

#[derive(Debug, Serialize)]
struct FailedChargesPayload<'a> {
    failed_invoice_ids: &'a [InvoiceId],
    count: usize,
}

/// POSTs the failed invoice ids as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn deliver(&self, failed: &[InvoiceId]) -> Result<(), WebhookError> {
        let payload = FailedChargesPayload {
            failed_invoice_ids: failed,
            count: failed.len(),
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(WebhookError::Status(resp.status()))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, failed: &[InvoiceId]) {
        match self.deliver(failed).await {
            Ok(()) => info!(url = %self.url, count = failed.len(), "failed-charge webhook delivered"),
            Err(err) => warn!(url = %self.url, error = %err, "failed-charge webhook not delivered"),
        }
    }
}
