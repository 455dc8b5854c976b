use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use rolescope_common::api::templates::{
    BranchTemplateRequest, CompareVersionsQuery, CompareVersionsResponse, CreateTemplateRequest,
    ListTemplateVersionsResponse, ListTemplatesQuery, ListTemplatesResponse, UpdateTemplateRequest,
};
use rolescope_common::ids::TemplateId;
use rolescope_common::types::prompt_template::TemplateStage;
use rolescope_common::types::PromptTemplate;
use rolescope_common::RolescopeError;

use crate::templates::{self, NewTemplate, TemplateUpdate};

use super::{ApiError, AppState, ValidatedJson};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/templates", post(create_template).get(list_templates))
        .route(
            "/api/v1/templates/{id}",
            get(get_template).patch(update_template).delete(delete_template),
        )
        .route("/api/v1/templates/{id}/versions", get(list_versions))
        .route("/api/v1/templates/{id}/versions/{n}", get(get_version))
        .route("/api/v1/templates/{id}/restore/{n}", post(restore_version))
        .route("/api/v1/templates/{id}/branch", post(branch_template))
        .route("/api/v1/templates/{id}/compare", get(compare_versions))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<PromptTemplate>), ApiError> {
    let stage = parse_stage(req.stage)?;

    let template = templates::create_template(
        &state.store,
        NewTemplate {
            name: req.name,
            category: req.category,
            stage,
            prompt_text: req.prompt_text,
            description: req.description,
            metadata: req.metadata.unwrap_or_default(),
            created_by: req.created_by,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<ListTemplatesResponse>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let (templates, total) = state
        .store
        .list_templates(
            query.category.as_deref(),
            query.stage.as_deref(),
            query.is_active,
            limit,
            offset,
        )
        .await?;

    Ok(Json(ListTemplatesResponse { templates, total }))
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptTemplate>, ApiError> {
    let template = state.store.get_template(TemplateId::from_uuid(id)).await.map_err(|e| match e {
        crate::store::StoreError::NotFound(_) => ApiError(RolescopeError::TemplateNotFound(id.to_string())),
        other => ApiError(other.into()),
    })?;
    Ok(Json(template))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTemplateRequest>,
) -> Result<Json<PromptTemplate>, ApiError> {
    let stage = match req.stage {
        Some(raw) => Some(parse_stage(Some(raw))?),
        None => None,
    };

    let template = templates::update_template(
        &state.store,
        TemplateId::from_uuid(id),
        TemplateUpdate {
            name: req.name,
            category: req.category,
            stage,
            prompt_text: req.prompt_text,
            description: req.description.map(Some),
            metadata: req.metadata,
            is_active: req.is_active,
            version_label: None,
            version_notes: None,
        },
    )
    .await?;

    Ok(Json(template))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_template(TemplateId::from_uuid(id)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(RolescopeError::TemplateNotFound(id.to_string())))
    }
}

async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListTemplateVersionsResponse>, ApiError> {
    let versions = state.store.list_template_versions(TemplateId::from_uuid(id)).await?;
    Ok(Json(ListTemplateVersionsResponse { versions }))
}

async fn get_version(
    State(state): State<Arc<AppState>>,
    Path((id, n)): Path<(Uuid, i32)>,
) -> Result<Json<rolescope_common::types::TemplateVersionHistory>, ApiError> {
    let version = state
        .store
        .get_template_version(TemplateId::from_uuid(id), n)
        .await
        .map_err(|e| match e {
            crate::store::StoreError::NotFound(_) => {
                ApiError(RolescopeError::TemplateNotFound(format!("{id} version {n}")))
            }
            other => ApiError(other.into()),
        })?;
    Ok(Json(version))
}

async fn restore_version(
    State(state): State<Arc<AppState>>,
    Path((id, n)): Path<(Uuid, i32)>,
) -> Result<Json<PromptTemplate>, ApiError> {
    let template = templates::restore_template(&state.store, TemplateId::from_uuid(id), n).await?;
    Ok(Json(template))
}

async fn branch_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<BranchTemplateRequest>,
) -> Result<(StatusCode, Json<PromptTemplate>), ApiError> {
    let branched = templates::branch_template(&state.store, TemplateId::from_uuid(id), req.name, req.created_by).await?;
    Ok((StatusCode::CREATED, Json(branched)))
}

async fn compare_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompareVersionsQuery>,
) -> Result<Json<CompareVersionsResponse>, ApiError> {
    let diff = templates::compare_versions(&state.store, TemplateId::from_uuid(id), query.a, query.b).await?;
    Ok(Json(CompareVersionsResponse { diff }))
}

fn parse_stage(raw: Option<String>) -> Result<Option<TemplateStage>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => TemplateStage::parse(&s)
            .map(Some)
            .ok_or_else(|| ApiError(RolescopeError::Validation(format!("unknown stage: {s}")))),
    }
}
