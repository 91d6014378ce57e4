// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
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
        roles::{AdminOrAbove, RequireRole, SuperAdminOnly},
    },
    models::user::{CreateAdminPayload, CreateStaffPayload, Role, UpdateUserPayload, User},
};

pub async fn create_admin(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let user = app_state.users_service.create_admin(payload).await?;
    Ok(Json(user))
}

pub async fn create_staff(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let user = app_state
        .users_service
        .create_staff(payload, actor.org_id)
        .await?;
    Ok(Json(user))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub organization_id: Option<Uuid>,
}

// GET /users lista ADMINs; só o SUPER_ADMIN chega aqui.
pub async fn list_admins(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<User>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state
        .users_service
        .list_by_role(Role::Admin, query.organization_id, page, limit)
        .await?;
    Ok(Json(response))
}

// GET /users/staff: ADMIN enxerga só o STAFF da própria organização;
// SUPER_ADMIN enxerga todos, podendo filtrar por organizationId.
pub async fn list_staff(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<User>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let scope = match actor.role {
        Role::SuperAdmin => query.organization_id,
        _ => actor.org_id,
    };
    let response = app_state
        .users_service
        .list_by_role(Role::Staff, scope, page, limit)
        .await?;
    Ok(Json(response))
}

pub async fn get_user(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let scope = match actor.role {
        Role::SuperAdmin => None,
        _ => actor.org_id,
    };
    let user = app_state.users_service.get(id, scope).await?;
    Ok(Json(user))
}

pub async fn update_user(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let scope = match actor.role {
        Role::SuperAdmin => None,
        _ => actor.org_id,
    };
    let user = app_state.users_service.update(id, payload, scope).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let scope = match actor.role {
        Role::SuperAdmin => None,
        _ => actor.org_id,
    };
    app_state.users_service.delete(id, scope).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
