// src/services/compliance_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginatedResponse, security::{sanitize_opt, sanitize_string}},
    db::{
        compliance_repo::{CodFilter, CodTrackingUpdate, NewCodRecord},
        ComplianceRepository, InvoiceRepository,
    },
    models::{
        auth::Claims,
        compliance::{CodListQuery, CreateCodPayload, RtoStatus, UpdateCodTrackingPayload, VehicleCodRecord},
        invoice::VechicleStatus,
        user::Role,
    },
};

// Coerência do COD na criação:
//   codGenerated = true  -> veículo DISMANTLED + inward + data de emissão;
//   codGenerated = false -> nenhum dos dois campos de emissão.
// invoiceId declarado pelo cliente tem que bater com o do veículo.
fn validate_cod_creation(
    payload: &CreateCodPayload,
    vehicle_status: VechicleStatus,
    vehicle_invoice_id: Uuid,
) -> Result<(), AppError> {
    if let Some(claimed) = payload.invoice_id {
        if claimed != vehicle_invoice_id {
            return Err(AppError::bad_request(
                "Vehicle does not belong to this invoice",
            ));
        }
    }
    if payload.cod_generated {
        if vehicle_status != VechicleStatus::Dismantled {
            return Err(AppError::bad_request(
                "COD can only be generated for a dismantled vehicle",
            ));
        }
        if payload.cod_inward_number.is_none() || payload.cod_issue_date.is_none() {
            return Err(AppError::bad_request(
                "COD inward number and issue date are required when COD is generated",
            ));
        }
    } else if payload.cod_inward_number.is_some() || payload.cod_issue_date.is_some() {
        return Err(AppError::bad_request(
            "COD inward number and issue date are not allowed when COD is not generated",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ComplianceService {
    compliance_repo: ComplianceRepository,
    invoice_repo: InvoiceRepository,
}

impl ComplianceService {
    pub fn new(compliance_repo: ComplianceRepository, invoice_repo: InvoiceRepository) -> Self {
        Self {
            compliance_repo,
            invoice_repo,
        }
    }

    fn scope_org(actor: &Claims) -> Option<Uuid> {
        match actor.role {
            Role::SuperAdmin => None,
            _ => actor.org_id,
        }
    }

    pub async fn create_cod_record(
        &self,
        payload: CreateCodPayload,
        actor: &Claims,
    ) -> Result<VehicleCodRecord, AppError> {
        let vehicle = self
            .invoice_repo
            .find_vehicle_by_id(payload.vehicle_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if vehicle.organization_id != org {
                return Err(AppError::not_found("Vehicle not found"));
            }
        }

        validate_cod_creation(&payload, vehicle.vechicle_status, vehicle.invoice_id)?;

        let record = NewCodRecord {
            organization_id: vehicle.organization_id,
            vehicle_id: vehicle.id,
            invoice_id: vehicle.invoice_id,
            cod_generated: payload.cod_generated,
            cod_inward_number: payload
                .cod_inward_number
                .as_deref()
                .map(sanitize_string),
            cod_issue_date: payload.cod_issue_date,
            rto_office: sanitize_opt(payload.rto_office.as_deref()),
            rto_status: payload.rto_status.unwrap_or(RtoStatus::NotApplied),
            remarks: sanitize_opt(payload.remarks.as_deref()),
            cod_document_url: payload.cod_document_url,
        };

        self.compliance_repo.create(&record).await
    }

    pub async fn get(&self, id: Uuid, actor: &Claims) -> Result<VehicleCodRecord, AppError> {
        let record = self
            .compliance_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("COD record not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if record.organization_id != org {
                return Err(AppError::not_found("COD record not found"));
            }
        }
        Ok(record)
    }

    pub async fn get_by_vehicle(
        &self,
        vehicle_id: Uuid,
        actor: &Claims,
    ) -> Result<VehicleCodRecord, AppError> {
        let record = self
            .compliance_repo
            .find_by_vehicle_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::not_found("COD record not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if record.organization_id != org {
                return Err(AppError::not_found("COD record not found"));
            }
        }
        Ok(record)
    }

    pub async fn list(
        &self,
        query: &CodListQuery,
        actor: &Claims,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<VehicleCodRecord>, AppError> {
        let filter = CodFilter {
            organization_id: Self::scope_org(actor),
            invoice_id: query.invoice_id,
            vehicle_id: query.vehicle_id,
            cod_generated: query.cod_generated,
            rto_status: query.rto_status,
        };
        let (data, total) = self
            .compliance_repo
            .find_paginated(&filter, page, limit)
            .await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    // Só os campos de acompanhamento do RTO mudam depois da criação.
    pub async fn update_tracking(
        &self,
        id: Uuid,
        payload: UpdateCodTrackingPayload,
        actor: &Claims,
    ) -> Result<VehicleCodRecord, AppError> {
        self.get(id, actor).await?;

        let update = CodTrackingUpdate {
            rto_office: sanitize_opt(payload.rto_office.as_deref()),
            rto_status: payload.rto_status,
            remarks: sanitize_opt(payload.remarks.as_deref()),
            cod_document_url: payload.cod_document_url,
        };
        self.compliance_repo
            .update_tracking(id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("COD record not found"))
    }

    pub async fn has_generated_cod_for_vehicle(&self, vehicle_id: Uuid) -> Result<bool, AppError> {
        self.compliance_repo.has_generated_cod(vehicle_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(
        cod_generated: bool,
        inward: Option<&str>,
        issue_date: Option<NaiveDate>,
    ) -> CreateCodPayload {
        CreateCodPayload {
            vehicle_id: Uuid::new_v4(),
            invoice_id: None,
            cod_generated,
            cod_inward_number: inward.map(String::from),
            cod_issue_date: issue_date,
            rto_office: None,
            rto_status: None,
            remarks: None,
            cod_document_url: None,
        }
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn generated_cod_requires_dismantled_vehicle() {
        let p = payload(true, Some("INW-1"), Some(june_first()));
        let err =
            validate_cod_creation(&p, VechicleStatus::Purchased, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn generated_cod_requires_inward_and_issue_date() {
        let missing_inward = payload(true, None, Some(june_first()));
        assert!(
            validate_cod_creation(&missing_inward, VechicleStatus::Dismantled, Uuid::new_v4())
                .is_err()
        );

        let missing_date = payload(true, Some("INW-1"), None);
        assert!(
            validate_cod_creation(&missing_date, VechicleStatus::Dismantled, Uuid::new_v4())
                .is_err()
        );

        let complete = payload(true, Some("INW-1"), Some(june_first()));
        assert!(
            validate_cod_creation(&complete, VechicleStatus::Dismantled, Uuid::new_v4()).is_ok()
        );
    }

    #[test]
    fn ungenerated_cod_rejects_issuance_fields() {
        let with_inward = payload(false, Some("INW-1"), None);
        assert!(
            validate_cod_creation(&with_inward, VechicleStatus::Purchased, Uuid::new_v4())
                .is_err()
        );

        let clean = payload(false, None, None);
        assert!(validate_cod_creation(&clean, VechicleStatus::Purchased, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn client_invoice_id_must_match_the_vehicle() {
        let actual = Uuid::new_v4();
        let mut p = payload(false, None, None);

        p.invoice_id = Some(Uuid::new_v4());
        assert!(validate_cod_creation(&p, VechicleStatus::Purchased, actual).is_err());

        p.invoice_id = Some(actual);
        assert!(validate_cod_creation(&p, VechicleStatus::Purchased, actual).is_ok());
    }
}
