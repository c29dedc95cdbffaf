use std::sync::Arc;

use anyhow::Context;

use chargebook_api::app::{build_app, build_services};
use chargebook_infra::{AppConfig, BillingScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("loading .env");
        }
    }
    chargebook_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let services = Arc::new(build_services(&config).await?);

    let scheduler = match config.scheduler.clone() {
        Some(schedule) => Some(BillingScheduler::spawn(services.job.clone(), schedule)),
        None => {
            tracing::info!("BILLING_INTERVAL_SECS=0; periodic billing disabled");
            None
        }
    };

    let app = build_app(services);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
