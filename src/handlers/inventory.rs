// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::PaginatedResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        roles::{RequireRole, StaffOrAbove},
    },
    models::inventory::{
        CreateInventoryBatchPayload, InventoryItem, InventoryListQuery, UpdateInventoryPayload,
    },
};

pub async fn create_batch(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateInventoryBatchPayload>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let items = app_state
        .inventory_service
        .create_batch(payload, &actor)
        .await
        .map_err(|e| e.into_domain("create_inventory_batch", "Failed to create inventory"))?;
    Ok(Json(items))
}

pub async fn list_inventory(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> Result<Json<PaginatedResponse<InventoryItem>>, AppError> {
    let response = app_state.inventory_service.list(query, &actor).await?;
    Ok(Json(response))
}

pub async fn get_inventory_item(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, AppError> {
    let item = app_state.inventory_service.get(id, &actor).await?;
    Ok(Json(item))
}

pub async fn update_inventory_item(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryPayload>,
) -> Result<Json<InventoryItem>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let item = app_state
        .inventory_service
        .update(id, payload, &actor)
        .await
        .map_err(|e| e.into_domain("update_inventory_item", "Failed to update inventory"))?;
    Ok(Json(item))
}

pub async fn delete_inventory_item(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.inventory_service.delete(id, &actor).await?;
    Ok(Json(json!({ "message": "Inventory item deleted" })))
}
