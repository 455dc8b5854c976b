use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    scraper: &'static str,
    open_circuit: Option<String>,
}

/// Unauthenticated liveness/readiness probe. Database health is checked
/// synchronously; the scraper probe is best-effort and cached, so a slow or
/// unreachable provider never delays this response beyond its own short
/// timeout.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = if state.store.health_check().await.is_ok() {
        "up"
    } else {
        "down"
    };

    let scraper = if state.scraper.health_check().await {
        "up"
    } else {
        "down"
    };

    let open_circuit = state.circuit_breakers.any_hard_open().map(str::to_string);
    let status = if database == "up" && open_circuit.is_none() { "ok" } else { "degraded" };

    Json(HealthResponse { status, database, scraper, open_circuit })
}
