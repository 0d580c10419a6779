//! System/health API handlers.
//!
//! # Purpose and responsibility
//! Provides a lightweight health endpoint for load balancers and orchestrators.
//!
//! # Key invariants and assumptions
//! - Health checks must be fast and side-effect free.
//! - Mounted outside the authorization middleware.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

/// Return control-plane health status.
///
/// # What it does
/// Probes the policy store and returns `ok` if healthy.
///
/// # Errors
/// - Returns 500 if the store health check fails.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    // Check backing store health to surface dependency availability.
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: state.store.backend_name().to_string(),
        durable: state.store.is_durable(),
    }))
}
