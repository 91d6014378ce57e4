// src/handlers/audit.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use uuid::Uuid;

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
    models::{
        audit::{AuditListQuery, AuditLog},
        user::Role,
    },
};

// GET /audit-logs: visão global, exclusiva do SUPER_ADMIN.
pub async fn list_audit_logs(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<PaginatedResponse<AuditLog>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state
        .audit_service
        .find_all_for_super_admin(&query, page, limit)
        .await?;
    Ok(Json(response))
}

// GET /audit-logs/staff: o ADMIN recebe apenas o rastro do STAFF da
// própria organização, recortado no SQL antes da paginação. O
// SUPER_ADMIN também pode usar a rota, filtrando por organizationId.
pub async fn list_staff_audit_logs(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<PaginatedResponse<AuditLog>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);

    let response = match actor.role {
        Role::SuperAdmin => {
            let org = query
                .organization_id
                .ok_or_else(|| AppError::bad_request("organizationId is required"))?;
            app_state
                .audit_service
                .find_all_for_admin(&query, org, page, limit)
                .await?
        }
        _ => {
            let org = actor
                .org_id
                .ok_or_else(|| AppError::forbidden("Actor has no organization"))?;
            app_state
                .audit_service
                .find_all_for_admin(&query, org, page, limit)
                .await?
        }
    };
    Ok(Json(response))
}

pub async fn get_audit_log(
    _guard: RequireRole<AdminOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditLog>, AppError> {
    let log = app_state.audit_service.find_by_id(id, &actor).await?;
    Ok(Json(log))
}

// Varredura manual do TTL, cobrindo a trilha e os refresh tokens.
// Normalmente disparada por um agendador externo.
pub async fn delete_expired_audit_logs(
    _guard: RequireRole<SuperAdminOnly>,
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = app_state.audit_service.delete_expired().await?;
    let tokens_removed = app_state.auth_service.purge_expired_tokens().await?;
    Ok(Json(json!({
        "removed": removed,
        "expiredTokensRemoved": tokens_removed,
    })))
}
