//! `Notifier` implementations that reach an operator.

pub mod email;
pub mod webhook;

pub use email::{
    EmailNotifier, LogMailTransport, MailError, MailMessage, MailTransport, NotificationConfig,
};
pub use webhook::{WebhookError, WebhookNotifier};
