// src/services/users_service.rs

use bcrypt::hash;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginatedResponse, security::sanitize_string},
    db::{OrganizationRepository, UserRepository},
    models::user::{CreateAdminPayload, CreateStaffPayload, Role, UpdateUserPayload, User},
};

#[derive(Clone)]
pub struct UsersService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
}

impl UsersService {
    pub fn new(user_repo: UserRepository, org_repo: OrganizationRepository) -> Self {
        Self { user_repo, org_repo }
    }

    // SUPER_ADMIN cria ADMINs, sempre presos a uma organização existente e ativa.
    pub async fn create_admin(&self, payload: CreateAdminPayload) -> Result<User, AppError> {
        let org = self
            .org_repo
            .find_by_id(payload.organization_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))?;
        if !org.is_active {
            return Err(AppError::bad_request("Organization is inactive"));
        }

        self.create_user(payload.name, payload.email, payload.password, Role::Admin, Some(org.id))
            .await
    }

    // ADMIN cria STAFF dentro da própria organização, nunca em outra.
    pub async fn create_staff(
        &self,
        payload: CreateStaffPayload,
        creator_org_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let org_id = creator_org_id
            .ok_or_else(|| AppError::forbidden("Creator has no organization"))?;

        self.create_user(payload.name, payload.email, payload.password, Role::Staff, Some(org_id))
            .await
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: Role,
        organization_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let name = sanitize_string(&name);
        let email = email.trim().to_lowercase();

        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.user_repo
            .create(&name, &email, &password_hash, role, organization_id)
            .await
    }

    // Listagem restrita ao papel pedido; ADMIN só enxerga a própria organização.
    pub async fn list_by_role(
        &self,
        role: Role,
        scope_org: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<User>, AppError> {
        let (data, total) = self
            .user_repo
            .find_paginated_by_role(role, scope_org, page, limit)
            .await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    pub async fn get(&self, id: Uuid, scope_org: Option<Uuid>) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if let Some(org) = scope_org {
            if user.organization_id != Some(org) {
                return Err(AppError::not_found("User not found"));
            }
        }
        Ok(user)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateUserPayload,
        scope_org: Option<Uuid>,
    ) -> Result<User, AppError> {
        // O get aplica o escopo antes de qualquer escrita.
        self.get(id, scope_org).await?;

        let name = payload.name.as_deref().map(sanitize_string);
        self.user_repo
            .update(id, name.as_deref(), payload.is_active)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn delete(&self, id: Uuid, scope_org: Option<Uuid>) -> Result<(), AppError> {
        self.get(id, scope_org).await?;
        let deleted = self.user_repo.delete(id).await?;
        if !deleted {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }
}
