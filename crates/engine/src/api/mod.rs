mod companies;
mod health;
mod profiles;
mod scoring;
mod templates;

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;

use rolescope_common::api::error::ErrorBody;
use rolescope_common::RolescopeError;

use crate::circuit_breaker::CircuitBreakerRegistry;
use crate::config::EngineConfig;
use crate::embeddings::EmbeddingClient;
use crate::llm::LlmClient;
use crate::scoring::ScoringWorkerPool;
use crate::scraper::ScraperClient;
use crate::store::StoreClient;

/// Everything an axum handler needs, shared behind `Arc` (§6.1).
pub struct AppState {
    pub store: Arc<StoreClient>,
    pub scraper: Arc<ScraperClient>,
    pub llm: Option<Arc<LlmClient>>,
    pub embeddings: Option<Arc<EmbeddingClient>>,
    pub scoring_workers: Arc<ScoringWorkerPool>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    pub config: Arc<EngineConfig>,
    pub metrics_handle: PrometheusHandle,
}

/// Wraps the domain error type so this crate can implement `IntoResponse`
/// for it without running into the orphan rule (§7).
pub struct ApiError(pub RolescopeError);

impl<E: Into<RolescopeError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Unhandled internal error");
        }
        let body = ErrorBody::new(self.0.error_code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` that renders deserialization failures as a `VALIDATION_ERROR`
/// body instead of axum's default plaintext rejection (§4.7).
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError(RolescopeError::Validation(e.to_string())))?;
        Ok(ValidatedJson(value))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .merge(profiles::router())
        .merge(companies::router())
        .merge(scoring::router())
        .merge(templates::router())
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), require_api_key));

    Router::new()
        .route("/api/v1/health", get(health::health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(authenticated)
        .with_state(state)
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

/// Constant-time API key comparison so response timing leaks nothing about
/// how many leading bytes of a guessed key matched (§4.7).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), state.config.api_key.as_bytes()) => {
            Ok(next.run(req).await)
        }
        _ => Err(ApiError(RolescopeError::Unauthorized)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equal_slices() {
        assert!(constant_time_eq(b"secret-key", b"secret-key"));
    }

    #[test]
    fn constant_time_eq_rejects_mismatched_length_or_content() {
        assert!(!constant_time_eq(b"secret-key", b"secret-ke"));
        assert!(!constant_time_eq(b"secret-key", b"wrong-key!"));
    }
}
