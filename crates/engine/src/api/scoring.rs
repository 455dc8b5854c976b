use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream};
use uuid::Uuid;

use rolescope_common::api::scoring::{CreateScoringJobRequest, ScoringJobResponse};
use rolescope_common::ids::{ProfileId, ScoringJobId, TemplateId};
use rolescope_common::types::scoring_job::ScoringJobStatus;
use rolescope_common::RolescopeError;

use crate::scoring;

use super::{ApiError, AppState, ValidatedJson};

const STREAM_POLL_INTERVAL: Duration = Duration::from_secs(2);
const STREAM_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/profiles/{id}/score", post(create_scoring_job))
        .route("/api/v1/scoring-jobs/{job_id}", get(get_scoring_job))
        .route("/api/v1/scoring-jobs/{job_id}/stream", get(stream_scoring_job))
        .route("/api/v1/scoring-jobs/{job_id}/retry", post(retry_scoring_job))
        .route("/api/v1/scoring-jobs/{job_id}/cancel", post(cancel_scoring_job))
}

async fn create_scoring_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateScoringJobRequest>,
) -> Result<(StatusCode, Json<ScoringJobResponse>), ApiError> {
    let template_id = req
        .template_id
        .map(|raw| {
            Uuid::parse_str(&raw)
                .map(TemplateId::from_uuid)
                .map_err(|_| ApiError(RolescopeError::Validation(format!("invalid template_id: {raw}"))))
        })
        .transpose()?;

    let job = scoring::create_scoring_job(
        &state.store,
        &state.config.system.llm,
        scoring::CreateScoringJobRequest {
            profile_id: ProfileId::from_uuid(id),
            template_id,
            prompt: req.prompt,
            model_name: req.model_name,
        },
    )
    .await?;

    Ok((StatusCode::ACCEPTED, Json(ScoringJobResponse { job })))
}

async fn get_scoring_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ScoringJobResponse>, ApiError> {
    let job = state
        .store
        .get_scoring_job(ScoringJobId::from_uuid(job_id))
        .await
        .map_err(|e| match e {
            crate::store::StoreError::NotFound(_) => ApiError(RolescopeError::JobNotFound(job_id.to_string())),
            other => ApiError(other.into()),
        })?;

    Ok(Json(ScoringJobResponse { job }))
}

async fn retry_scoring_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ScoringJobResponse>, ApiError> {
    let job = scoring::retry_scoring_job(&state.store, ScoringJobId::from_uuid(job_id)).await?;
    Ok(Json(ScoringJobResponse { job }))
}

async fn cancel_scoring_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ScoringJobResponse>, ApiError> {
    let job = scoring::cancel_scoring_job(&state.store, ScoringJobId::from_uuid(job_id)).await?;
    Ok(Json(ScoringJobResponse { job }))
}

/// Polls the job row every `STREAM_POLL_INTERVAL` and emits a `job` event on
/// every poll, closing the stream once the job reaches a terminal state.
/// Heartbeats keep idle connections (e.g. through a proxy) from timing out
/// while the job sits in `pending`/`processing` (§4.5).
async fn stream_scoring_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id = ScoringJobId::from_uuid(job_id);
    state.store.get_scoring_job(id).await.map_err(|e| match e {
        crate::store::StoreError::NotFound(_) => ApiError(RolescopeError::JobNotFound(job_id.to_string())),
        other => ApiError(other.into()),
    })?;

    let store = Arc::clone(&state.store);
    let stream = stream::unfold(Some(store), move |store| async move {
        let store = store?;
        tokio::time::sleep(STREAM_POLL_INTERVAL).await;

        match store.get_scoring_job(id).await {
            Ok(job) => {
                let done = job.status != ScoringJobStatus::Pending && job.status != ScoringJobStatus::Processing;
                let payload = serde_json::to_string(&ScoringJobResponse { job })
                    .unwrap_or_else(|_| "{}".to_string());
                let event = Event::default().event("job").data(payload);
                let next_state = if done { None } else { Some(store) };
                Some((Ok(event), next_state))
            }
            Err(e) => {
                let event = Event::default().event("error").data(e.to_string());
                Some((Ok(event), None))
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(STREAM_HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    ))
}
