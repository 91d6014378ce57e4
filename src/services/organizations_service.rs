// src/services/organizations_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginatedResponse, security::sanitize_string},
    db::OrganizationRepository,
    models::organization::{CreateOrganizationPayload, Organization, UpdateOrganizationPayload},
};

#[derive(Clone)]
pub struct OrganizationsService {
    org_repo: OrganizationRepository,
}

impl OrganizationsService {
    pub fn new(org_repo: OrganizationRepository) -> Self {
        Self { org_repo }
    }

    pub async fn create(
        &self,
        payload: CreateOrganizationPayload,
    ) -> Result<Organization, AppError> {
        let name = sanitize_string(&payload.name);
        self.org_repo.create(&name).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Organization, AppError> {
        self.org_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))
    }

    pub async fn list(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<Organization>, AppError> {
        let (data, total) = self.org_repo.find_paginated(page, limit).await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateOrganizationPayload,
    ) -> Result<Organization, AppError> {
        let name = payload.name.as_deref().map(sanitize_string);
        self.org_repo
            .update(id, name.as_deref(), payload.is_active)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))
    }
}
