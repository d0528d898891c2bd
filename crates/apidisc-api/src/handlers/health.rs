//! Liveness and readiness probes

use axum::extract::State;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /readyz
pub async fn readyz(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    if state.is_ready() {
        Ok("ok")
    } else {
        Err(ApiError::ServiceUnavailable(
            "discovery has not converged".to_string(),
        ))
    }
}
