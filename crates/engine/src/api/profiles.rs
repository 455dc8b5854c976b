use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use rolescope_common::api::profiles::{
    CompanyProcessedEntry, CreateProfileRequest, CreateProfileResponse, ListProfilesQuery,
    ListProfilesResponse, PipelineMetadata,
};
use rolescope_common::ids::ProfileId;
use rolescope_common::types::profile::SuggestedRole;
use rolescope_common::RolescopeError;

use crate::ingestion;

use super::{ApiError, AppState, ValidatedJson};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/profiles", post(create_profile).get(list_or_find_profile))
        .route("/api/v1/profiles/{id}", get(get_profile).delete(delete_profile))
}

async fn create_profile(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateProfileRequest>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), ApiError> {
    let suggested_role = match req.suggested_role {
        Some(raw) => Some(
            SuggestedRole::parse(&raw)
                .ok_or_else(|| ApiError(RolescopeError::Validation(format!("unknown suggested_role: {raw}"))))?,
        ),
        None => None,
    };

    let result = ingestion::ingest_profile(
        &state.store,
        &state.scraper,
        &req.linkedin_url,
        suggested_role,
        req.include_companies,
    )
    .await?;

    let companies_processed = result
        .companies_processed
        .into_iter()
        .map(|c| CompanyProcessedEntry {
            company_id: c.company_id.to_string(),
            name: c.name,
            outcome: c.outcome,
        })
        .collect();

    let response = CreateProfileResponse {
        profile: result.profile,
        companies_processed,
        pipeline_metadata: PipelineMetadata {
            companies_found: result.pipeline_metadata.companies_found,
            companies_fetched_from_cassidy: result.pipeline_metadata.companies_fetched,
            pipeline_status: result.pipeline_metadata.pipeline_status.to_string(),
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Backs both `GET /profiles?linkedin_url=` (single-result convenience for
/// Make-style clients) and the paginated listing (§6.1).
async fn list_or_find_profile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Json<ListProfilesResponse>, ApiError> {
    if let Some(url) = query.linkedin_url {
        let profiles = match state.store.get_profile_by_url(&url).await? {
            Some(profile) => vec![profile],
            None => Vec::new(),
        };
        let total = profiles.len() as i64;
        return Ok(Json(ListProfilesResponse { profiles, total }));
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let (profiles, total) = state.store.list_profiles(limit, offset).await?;

    Ok(Json(ListProfilesResponse { profiles, total }))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<rolescope_common::types::Profile>, ApiError> {
    let profile = state.store.get_profile(ProfileId::from_uuid(id)).await.map_err(|e| match e {
        crate::store::StoreError::NotFound(_) => ApiError(RolescopeError::ProfileNotFound(id.to_string())),
        other => ApiError(other.into()),
    })?;
    Ok(Json(profile))
}

async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_profile(ProfileId::from_uuid(id)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(RolescopeError::ProfileNotFound(id.to_string())))
    }
}
