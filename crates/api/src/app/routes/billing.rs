use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::post, Json, Router};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/run", post(run_billing))
}

/// Run one billing batch now and return its report.
pub async fn run_billing(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.job.run_once().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::billing_error_to_response(e),
    }
}
