// src/services/audit_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginatedResponse},
    db::{audit_repo::AuditFilter, AuditRepository},
    models::{
        audit::{AuditListQuery, AuditLog, NewAuditLog},
        auth::Claims,
        user::Role,
    },
};

// Retenção em dias por papel do ator registrado.
pub fn retention_days(role: Role) -> i64 {
    match role {
        Role::SuperAdmin | Role::Admin => 30,
        Role::Staff => 15,
        Role::System => 7,
    }
}

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository) -> Self {
        Self { audit_repo }
    }

    // Gravação disparada pelo middleware; falha aqui nunca derruba a
    // requisição original, só vira log de erro.
    pub async fn record(&self, entry: NewAuditLog) {
        let days = retention_days(entry.actor_role);
        if let Err(e) = self.audit_repo.create(&entry, days).await {
            tracing::error!("🚨 Falha ao gravar auditoria: {:?}", e);
        }
    }

    // SUPER_ADMIN enxerga tudo e pode filtrar livremente.
    pub async fn find_all_for_super_admin(
        &self,
        query: &AuditListQuery,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<AuditLog>, AppError> {
        let filter = AuditFilter {
            organization_id: query.organization_id,
            actor_role: query.actor_role,
            actor_id: query.actor_id,
            action: query.action,
            resource: query.resource.clone(),
            status: query.status,
            from: query.from,
            to: query.to,
        };
        let (data, total) = self.audit_repo.find_paginated(&filter, page, limit).await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    // ADMIN só vê o rastro do STAFF da própria organização. O recorte é
    // aplicado no SQL, antes da paginação.
    pub async fn find_all_for_admin(
        &self,
        query: &AuditListQuery,
        admin_org: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<AuditLog>, AppError> {
        let filter = AuditFilter {
            organization_id: Some(admin_org),
            actor_role: Some(Role::Staff),
            actor_id: query.actor_id,
            action: query.action,
            resource: query.resource.clone(),
            status: query.status,
            from: query.from,
            to: query.to,
        };
        let (data, total) = self.audit_repo.find_paginated(&filter, page, limit).await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    pub async fn find_by_id(&self, id: Uuid, actor: &Claims) -> Result<AuditLog, AppError> {
        let log = self
            .audit_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit log not found"))?;

        match actor.role {
            Role::SuperAdmin => Ok(log),
            Role::Admin => {
                if log.organization_id == actor.org_id && log.actor_role == Role::Staff {
                    Ok(log)
                } else {
                    Err(AppError::not_found("Audit log not found"))
                }
            }
            _ => Err(AppError::forbidden("Insufficient permissions")),
        }
    }

    // Varredura do TTL, exposta numa rota de manutenção.
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let removed = self.audit_repo.delete_expired().await?;
        if removed > 0 {
            tracing::info!("🧹 {} registros de auditoria expirados removidos", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_follows_role_hierarchy() {
        assert_eq!(retention_days(Role::SuperAdmin), 30);
        assert_eq!(retention_days(Role::Admin), 30);
        assert_eq!(retention_days(Role::Staff), 15);
        assert_eq!(retention_days(Role::System), 7);
    }
}
