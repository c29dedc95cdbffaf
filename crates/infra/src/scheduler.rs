//! Periodic billing runs.
//!
//! One background task drives [`BillingJob::run_once`] on a fixed interval.
//! A tick runs to completion before the next one is considered and missed ticks
//! are skipped, so two batches never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use chargebook_billing::BillingJob;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Run the first batch right away instead of after one interval.
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            run_immediately: false,
        }
    }
}

impl SchedulerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_run_immediately(mut self, run_immediately: bool) -> Self {
        self.run_immediately = run_immediately;
        self
    }
}

/// Handle to a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling and wait for the task to exit. A batch in progress is
    /// allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "billing scheduler task ended abnormally");
        }
    }
}

pub struct BillingScheduler;

impl BillingScheduler {
    /// Spawn the scheduler on the current tokio runtime.
    pub fn spawn(job: Arc<BillingJob>, config: SchedulerConfig) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(scheduler_loop(job, config, shutdown_rx));
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

async fn scheduler_loop(
    job: Arc<BillingJob>,
    config: SchedulerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = config.interval.max(MIN_INTERVAL);
    let start = if config.run_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = period.as_secs(), "billing scheduler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => process_tick(&job).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("billing scheduler stopped");
}

async fn process_tick(job: &BillingJob) {
    match job.run_once().await {
        Ok(report) => info!(
            run_id = %report.run_id,
            attempted = report.attempted,
            charged = report.charged,
            failed = report.failed.len(),
            errored = report.errored.len(),
            "scheduled billing run complete"
        ),
        Err(err) => warn!(error = %err, "scheduled billing run failed"),
    }
}
