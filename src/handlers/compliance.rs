// src/handlers/compliance.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{get_pagination, PaginatedResponse},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        roles::{RequireRole, StaffOrAbove},
    },
    models::compliance::{
        CodListQuery, CreateCodPayload, UpdateCodTrackingPayload, VehicleCodRecord,
    },
};

pub async fn create_cod_record(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCodPayload>,
) -> Result<Json<VehicleCodRecord>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let record = app_state
        .compliance_service
        .create_cod_record(payload, &actor)
        .await
        .map_err(|e| e.into_domain("create_cod_record", "Failed to create COD record"))?;
    Ok(Json(record))
}

pub async fn list_cod_records(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<CodListQuery>,
) -> Result<Json<PaginatedResponse<VehicleCodRecord>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state
        .compliance_service
        .list(&query, &actor, page, limit)
        .await?;
    Ok(Json(response))
}

pub async fn get_cod_record(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleCodRecord>, AppError> {
    let record = app_state.compliance_service.get(id, &actor).await?;
    Ok(Json(record))
}

pub async fn get_cod_record_by_vehicle(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<VehicleCodRecord>, AppError> {
    let record = app_state
        .compliance_service
        .get_by_vehicle(vehicle_id, &actor)
        .await?;
    Ok(Json(record))
}

pub async fn update_cod_tracking(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCodTrackingPayload>,
) -> Result<Json<VehicleCodRecord>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let record = app_state
        .compliance_service
        .update_tracking(id, payload, &actor)
        .await?;
    Ok(Json(record))
}
