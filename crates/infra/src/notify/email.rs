//! Email alerts for failed charges.
//!
//! Composition lives here; delivery is behind [`MailTransport`] so the SMTP
//! relay (or anything else) can be swapped without touching the message.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use chargebook_billing::Notifier;
use chargebook_core::{Clock, InvoiceId};

/// Placeholder in `text_template` replaced by the failed invoice ids.
pub const IDS_PLACEHOLDER: &str = "{ids}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Recipient. Alerts are skipped when unset.
    pub support_email: Option<String>,
    pub subject: String,
    pub text_template: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            support_email: None,
            subject: "Invoices could not be charged".to_string(),
            text_template: "The following invoices could not be charged: {ids}".to_string(),
        }
    }
}

impl NotificationConfig {
    pub fn with_support_email(mut self, email: impl Into<String>) -> Self {
        self.support_email = Some(email.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_text_template(mut self, template: impl Into<String>) -> Self {
        self.text_template = template.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub headers: Vec<(String, String)>,
}

impl MailMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("message rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

#[async_trait]
impl<T> MailTransport for Arc<T>
where
    T: MailTransport + ?Sized,
{
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        (**self).send(message).await
    }
}

/// Transport that writes messages to the log instead of sending them.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            sent_at = %message.sent_at,
            "mail message"
        );
        Ok(())
    }
}

pub struct EmailNotifier<T> {
    transport: T,
    config: NotificationConfig,
    clock: Arc<dyn Clock>,
}

impl<T: MailTransport> EmailNotifier<T> {
    pub fn new(transport: T, config: NotificationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            config,
            clock,
        }
    }

    /// Build the alert for `failed`, or `None` when no recipient is configured.
    pub fn compose(&self, failed: &[InvoiceId]) -> Option<MailMessage> {
        let to = self.config.support_email.as_ref()?;
        let ids = failed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Some(MailMessage {
            to: to.clone(),
            subject: self.config.subject.clone(),
            body: self.config.text_template.replace(IDS_PLACEHOLDER, &ids),
            sent_at: self.clock.now(),
            headers: vec![("X-Priority".to_string(), "1".to_string())],
        })
    }
}

#[async_trait]
impl<T: MailTransport> Notifier for EmailNotifier<T> {
    async fn notify(&self, failed: &[InvoiceId]) {
        let Some(message) = self.compose(failed) else {
            info!(count = failed.len(), "no support email configured; skipping alert");
            return;
        };
        match self.transport.send(&message).await {
            Ok(()) => info!(to = %message.to, count = failed.len(), "failed-charge alert sent"),
            Err(err) => error!(to = %message.to, error = %err, "failed to send failed-charge alert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargebook_core::FixedClock;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(MailError::Unavailable("relay down".to_string()));
            }
            Ok(())
        }
    }

    fn sent_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap()
    }

    fn notifier(
        config: NotificationConfig,
        transport: Arc<RecordingTransport>,
    ) -> EmailNotifier<Arc<RecordingTransport>> {
        EmailNotifier::new(transport, config, Arc::new(FixedClock::new(sent_at())))
    }

    fn ids(raw: &[i64]) -> Vec<InvoiceId> {
        raw.iter().copied().map(InvoiceId::new).collect()
    }

    #[tokio::test]
    async fn alert_lists_ids_and_is_high_priority() {
        let transport = Arc::new(RecordingTransport::default());
        let config = NotificationConfig::default()
            .with_support_email("support@example.com")
            .with_subject("Billing run")
            .with_text_template("Unpaid: {ids}.");

        notifier(config, transport.clone())
            .notify(&ids(&[3, 17, 42]))
            .await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.to, "support@example.com");
        assert_eq!(message.subject, "Billing run");
        assert_eq!(message.body, "Unpaid: 3, 17, 42.");
        assert_eq!(message.sent_at, sent_at());
        assert_eq!(message.header("x-priority"), Some("1"));
    }

    #[tokio::test]
    async fn missing_support_email_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = notifier(NotificationConfig::default(), transport.clone());

        assert!(notifier.compose(&ids(&[1])).is_none());
        notifier.notify(&ids(&[1])).await;

        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        });
        let config = NotificationConfig::default().with_support_email("ops@example.com");

        notifier(config, transport.clone()).notify(&ids(&[5])).await;

        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn log_transport_accepts_every_message() {
        let config = NotificationConfig::default().with_support_email("ops@example.com");
        let notifier = EmailNotifier::new(
            LogMailTransport,
            config,
            Arc::new(FixedClock::new(sent_at())),
        );
        let message = notifier.compose(&ids(&[8])).unwrap();

        assert!(LogMailTransport.send(&message).await.is_ok());
        assert_eq!(
            message.body,
            "The following invoices could not be charged: 8"
        );
    }
}
