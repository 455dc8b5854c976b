use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use rolescope_common::api::companies::{
    CompanyProfileEntry, ListCompanyProfilesQuery, ListCompanyProfilesResponse,
    ListCompaniesQuery, ListCompaniesResponse,
};
use rolescope_common::ids::CompanyId;
use rolescope_common::types::Company;
use rolescope_common::RolescopeError;

use super::{ApiError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/companies", get(list_companies))
        .route("/api/v1/companies/{id}", get(get_company))
        .route("/api/v1/companies/{id}/profiles", get(list_company_profiles))
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCompaniesQuery>,
) -> Result<Json<ListCompaniesResponse>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let (companies, total) = state
        .store
        .list_companies(
            query.search.as_deref(),
            query.industry.as_deref(),
            query.employee_range.as_deref(),
            limit,
            offset,
        )
        .await?;

    Ok(Json(ListCompaniesResponse { companies, total }))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    let company = state.store.get_company(CompanyId::from_uuid(id)).await.map_err(|e| match e {
        crate::store::StoreError::NotFound(_) => ApiError(RolescopeError::CompanyNotFound(id.to_string())),
        other => ApiError(other.into()),
    })?;
    Ok(Json(company))
}

async fn list_company_profiles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListCompanyProfilesQuery>,
) -> Result<Json<ListCompanyProfilesResponse>, ApiError> {
    let current_only = query.current_only.unwrap_or(false);
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let (rows, total) = state
        .store
        .list_profiles_for_company(CompanyId::from_uuid(id), current_only, limit, offset)
        .await?;

    let profiles = rows
        .into_iter()
        .map(|(edge, profile)| CompanyProfileEntry {
            profile,
            position_title: edge.position_title,
            is_current_role: edge.is_current_role,
        })
        .collect();

    Ok(Json(ListCompanyProfilesResponse { profiles, total }))
}
