//! Configuration loading from environment variables.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use chargebook_billing::BillingConfig;

use crate::notify::NotificationConfig;
use crate::scheduler::SchedulerConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the binary needs to wire the service.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres URL. In-memory stores with demo data are used when unset.
    pub database_url: Option<String>,
    pub billing: BillingConfig,
    /// `None` disables periodic runs (`BILLING_INTERVAL_SECS=0`).
    pub scheduler: Option<SchedulerConfig>,
    pub notification: NotificationConfig,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
    /// Authorization probability for the simulated provider.
    pub provider_success_rate: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_url: None,
            billing: BillingConfig::default(),
            scheduler: Some(SchedulerConfig::default()),
            notification: NotificationConfig::default(),
            webhook_url: None,
            webhook_timeout: Duration::from_secs(10),
            provider_success_rate: 0.5,
        }
    }
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = AppConfig::default();

        if let Some(addr) = parse(&get, "BIND_ADDR")? {
            config.bind_addr = addr;
        }
        config.database_url = get("DATABASE_URL");

        if let Some(max) = parse::<usize>(&get, "BILLING_MAX_CONCURRENT")? {
            if max == 0 {
                return Err(invalid("BILLING_MAX_CONCURRENT", "0", "must be at least 1"));
            }
            config.billing = config.billing.with_max_concurrent(max);
        }
        if let Some(ms) = parse::<u64>(&get, "BILLING_CHARGE_TIMEOUT_MS")? {
            let timeout = (ms > 0).then(|| Duration::from_millis(ms));
            config.billing = config.billing.with_charge_timeout(timeout);
        }

        if let Some(secs) = parse::<u64>(&get, "BILLING_INTERVAL_SECS")? {
            config.scheduler = (secs > 0)
                .then(|| SchedulerConfig::default().with_interval(Duration::from_secs(secs)));
        }
        if let Some(immediately) = parse::<bool>(&get, "BILLING_RUN_IMMEDIATELY")? {
            config.scheduler = config
                .scheduler
                .map(|s| s.with_run_immediately(immediately));
        }

        if let Some(email) = get("SUPPORT_EMAIL") {
            config.notification = config.notification.with_support_email(email);
        }
        if let Some(subject) = get("MAIL_SUBJECT") {
            config.notification = config.notification.with_subject(subject);
        }
        if let Some(text) = get("MAIL_TEXT") {
            config.notification = config.notification.with_text_template(text);
        }
        config.webhook_url = get("NOTIFY_WEBHOOK_URL");
        if let Some(ms) = parse::<u64>(&get, "NOTIFY_WEBHOOK_TIMEOUT_MS")? {
            config.webhook_timeout = Duration::from_millis(ms);
        }

        if let Some(rate) = parse::<f64>(&get, "PROVIDER_SUCCESS_RATE")? {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(
                    "PROVIDER_SUCCESS_RATE",
                    &rate.to_string(),
                    "must be between 0 and 1",
                ));
            }
            config.provider_success_rate = rate;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|err: T::Err| invalid(key, &raw, err.to_string())),
    }
}
