// src/db/audit_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::offset},
    models::{
        audit::{AuditAction, AuditLog, AuditStatus, NewAuditLog},
        user::Role,
    },
};

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub organization_id: Option<Uuid>,
    pub actor_role: Option<Role>,
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub resource: Option<String>,
    pub status: Option<AuditStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// Filtros compartilhados entre a listagem e a contagem. Registro além
// do expire_at some das leituras mesmo antes da varredura física.
const LIST_FILTER: &str = r#"($1::uuid IS NULL OR organization_id = $1)
              AND ($2::user_role IS NULL OR actor_role = $2)
              AND ($3::uuid IS NULL OR actor_id = $3)
              AND ($4::audit_action IS NULL OR action = $4)
              AND ($5::text IS NULL OR resource = $5)
              AND ($6::audit_status IS NULL OR status = $6)
              AND ($7::timestamptz IS NULL OR created_at >= $7)
              AND ($8::timestamptz IS NULL OR created_at <= $8)
              AND expire_at > now()"#;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // expire_at = now() + retenção em dias (derivada do papel do ator).
    pub async fn create(
        &self,
        entry: &NewAuditLog,
        retention_days: i64,
    ) -> Result<AuditLog, AppError> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (
                actor_id, actor_role, organization_id, action, resource, resource_id,
                status, error_message, ip, user_agent, browser, os, device, payload,
                expire_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    now() + make_interval(days => $15::int))
            RETURNING *
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.actor_role)
        .bind(entry.organization_id)
        .bind(entry.action)
        .bind(&entry.resource)
        .bind(entry.resource_id)
        .bind(entry.status)
        .bind(entry.error_message.as_deref())
        .bind(entry.ip.as_deref())
        .bind(entry.user_agent.as_deref())
        .bind(entry.browser.as_deref())
        .bind(entry.os.as_deref())
        .bind(entry.device.as_deref())
        .bind(entry.payload.as_ref())
        .bind(retention_days)
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    // Os filtros são aplicados no SQL, antes da paginação, para que
    // page/limit contem sobre o conjunto já restrito.
    pub async fn find_paginated(
        &self,
        filter: &AuditFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<AuditLog>, i64), AppError> {
        let data = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT * FROM audit_logs
            WHERE {LIST_FILTER}
            ORDER BY created_at DESC
            LIMIT $9 OFFSET $10
            "#,
        ))
        .bind(filter.organization_id)
        .bind(filter.actor_role)
        .bind(filter.actor_id)
        .bind(filter.action)
        .bind(filter.resource.as_deref())
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM audit_logs WHERE {LIST_FILTER}",
        ))
        .bind(filter.organization_id)
        .bind(filter.actor_role)
        .bind(filter.actor_id)
        .bind(filter.action)
        .bind(filter.resource.as_deref())
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        Ok((data, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditLog>, AppError> {
        let log = sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_logs WHERE id = $1 AND expire_at > now()",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(log)
    }

    // Varredura do TTL: apaga fisicamente tudo que passou do expire_at.
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE expire_at < now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A varredura física é manutenção; a invisibilidade após o expire_at
    // tem que valer já na leitura.
    #[test]
    fn list_filter_hides_rows_past_their_expiry() {
        assert!(LIST_FILTER.contains("expire_at > now()"));
    }
}
