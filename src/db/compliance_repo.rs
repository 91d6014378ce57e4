// src/db/compliance_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::offset},
    models::compliance::{RtoStatus, VehicleCodRecord},
};

// Registro COD pronto para inserção, já validado pelo serviço
// (coerência entre cod_generated e os campos de emissão).
#[derive(Debug, Clone)]
pub struct NewCodRecord {
    pub organization_id: Uuid,
    pub vehicle_id: Uuid,
    pub invoice_id: Uuid,
    pub cod_generated: bool,
    pub cod_inward_number: Option<String>,
    pub cod_issue_date: Option<NaiveDate>,
    pub rto_office: Option<String>,
    pub rto_status: RtoStatus,
    pub remarks: Option<String>,
    pub cod_document_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CodFilter {
    pub organization_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub cod_generated: Option<bool>,
    pub rto_status: Option<RtoStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct CodTrackingUpdate {
    pub rto_office: Option<String>,
    pub rto_status: Option<RtoStatus>,
    pub remarks: Option<String>,
    pub cod_document_url: Option<String>,
}

#[derive(Clone)]
pub struct ComplianceRepository {
    pool: PgPool,
}

impl ComplianceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // A UNIQUE em vehicle_id é quem garante "um COD por veículo".
    pub async fn create(&self, record: &NewCodRecord) -> Result<VehicleCodRecord, AppError> {
        sqlx::query_as::<_, VehicleCodRecord>(
            r#"
            INSERT INTO vehicle_cod_records (
                organization_id, vehicle_id, invoice_id, cod_generated, cod_inward_number,
                cod_issue_date, rto_office, rto_status, remarks, cod_document_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(record.organization_id)
        .bind(record.vehicle_id)
        .bind(record.invoice_id)
        .bind(record.cod_generated)
        .bind(record.cod_inward_number.as_deref())
        .bind(record.cod_issue_date)
        .bind(record.rto_office.as_deref())
        .bind(record.rto_status)
        .bind(record.remarks.as_deref())
        .bind(record.cod_document_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::conflict("COD already exists for this vehicle");
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<VehicleCodRecord>, AppError> {
        let record = sqlx::query_as::<_, VehicleCodRecord>(
            "SELECT * FROM vehicle_cod_records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn find_by_vehicle_id(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Option<VehicleCodRecord>, AppError> {
        let record = sqlx::query_as::<_, VehicleCodRecord>(
            "SELECT * FROM vehicle_cod_records WHERE vehicle_id = $1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn find_paginated(
        &self,
        filter: &CodFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<VehicleCodRecord>, i64), AppError> {
        let offset = offset(page, limit);
        let data = sqlx::query_as::<_, VehicleCodRecord>(
            r#"
            SELECT * FROM vehicle_cod_records
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::uuid IS NULL OR invoice_id = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
              AND ($4::boolean IS NULL OR cod_generated = $4)
              AND ($5::rto_status IS NULL OR rto_status = $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.invoice_id)
        .bind(filter.vehicle_id)
        .bind(filter.cod_generated)
        .bind(filter.rto_status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM vehicle_cod_records
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::uuid IS NULL OR invoice_id = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
              AND ($4::boolean IS NULL OR cod_generated = $4)
              AND ($5::rto_status IS NULL OR rto_status = $5)
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.invoice_id)
        .bind(filter.vehicle_id)
        .bind(filter.cod_generated)
        .bind(filter.rto_status)
        .fetch_one(&self.pool)
        .await?;

        Ok((data, total))
    }

    // Atualização de acompanhamento: só os campos de rastreio mudam,
    // nunca o trio de geração (cod_generated / inward / issue date).
    pub async fn update_tracking(
        &self,
        id: Uuid,
        update: &CodTrackingUpdate,
    ) -> Result<Option<VehicleCodRecord>, AppError> {
        let record = sqlx::query_as::<_, VehicleCodRecord>(
            r#"
            UPDATE vehicle_cod_records
            SET rto_office = COALESCE($2, rto_office),
                rto_status = COALESCE($3, rto_status),
                remarks = COALESCE($4, remarks),
                cod_document_url = COALESCE($5, cod_document_url),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.rto_office.as_deref())
        .bind(update.rto_status)
        .bind(update.remarks.as_deref())
        .bind(update.cod_document_url.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn has_generated_cod(&self, vehicle_id: Uuid) -> Result<bool, AppError> {
        let generated: Option<bool> = sqlx::query_scalar(
            "SELECT cod_generated FROM vehicle_cod_records WHERE vehicle_id = $1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(generated.unwrap_or(false))
    }
}
