use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{instrument, warn};

use super::metrics::metrics_handler;
use crate::observability::Metrics;
use crate::repositories::Database;

/// State behind `/health/status` and `/metrics`
#[derive(Clone)]
pub struct OperationalState {
    pub metrics: Arc<Metrics>,
    /// Absent when the app runs without a pool, e.g. in router tests
    pub database: Option<Database>,
}

impl FromRef<OperationalState> for Arc<Metrics> {
    fn from_ref(state: &OperationalState) -> Self {
        state.metrics.clone()
    }
}

pub fn create_operational_router(metrics: Arc<Metrics>, database: Option<Database>) -> Router {
    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(OperationalState { metrics, database })
}

/// Health check endpoint handler
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(
    State(state): State<OperationalState>,
) -> (StatusCode, Json<Value>) {
    let database_ok = match &state.database {
        Some(database) => match database.ping().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Database ping failed");
                false
            }
        },
        None => true,
    };

    let (status, label) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "storefront-rs",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
