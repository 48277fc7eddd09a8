use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::state::AppState;

/// Liveness probe that also reports whether a pooled database connection
/// can still be checked out.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = match state.pool.get() {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };
    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "status": "ok", "database": database })))
}
