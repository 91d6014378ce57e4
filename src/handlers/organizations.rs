// src/handlers/organizations.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{get_pagination, PaginatedResponse, PaginationQuery},
    },
    config::AppState,
    middleware::roles::{RequireRole, SuperAdminOnly},
    models::organization::{CreateOrganizationPayload, Organization, UpdateOrganizationPayload},
};

pub async fn create_organization(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateOrganizationPayload>,
) -> Result<Json<Organization>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let org = app_state.organizations_service.create(payload).await?;
    Ok(Json(org))
}

pub async fn list_organizations(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<Organization>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state.organizations_service.list(page, limit).await?;
    Ok(Json(response))
}

pub async fn get_organization(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Organization>, AppError> {
    let org = app_state.organizations_service.get(id).await?;
    Ok(Json(org))
}

pub async fn update_organization(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrganizationPayload>,
) -> Result<Json<Organization>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let org = app_state.organizations_service.update(id, payload).await?;
    Ok(Json(org))
}
