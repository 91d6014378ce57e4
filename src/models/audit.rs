use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

// Taxonomia fechada de ações auditadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    LoginSuccess,
    LoginFailed,
    Logout,
    RefreshToken,
    ResetPassword,
    CreateAdmin,
    CreateStaff,
    UpdateUser,
    DeleteUser,
    CreateOrganization,
    CreateInvoice,
    UpdateInvoice,
    DeleteInvoice,
    CreateVechileInvoice,
    UpdateVechileInvoice,
    DeleteVechileInvoice,
    UploadPurchaseDocument,
    ApiCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

// Registro imutável, com TTL derivado do papel do ator no momento da ação.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_role: Role,
    pub organization_id: Option<Uuid>,
    pub action: AuditAction,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<AuditAction>,
    pub resource: Option<String>,
    pub status: Option<AuditStatus>,
    pub actor_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub actor_role: Option<Role>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// Entrada montada pelo middleware de auditoria antes da persistência.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor_id: Option<Uuid>,
    pub actor_role: Role,
    pub organization_id: Option<Uuid>,
    pub action: AuditAction,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub payload: Option<serde_json::Value>,
}
