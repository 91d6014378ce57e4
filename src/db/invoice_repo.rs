// src/db/invoice_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::offset},
    models::invoice::{
        FuelType, Invoice, InvoiceStatus, PurchaseDocument, SellerDetails, SellerType,
        VehicleInvoice, VehicleType,
    },
};

// Registro pronto para inserção, já sanitizado pelo serviço.
#[derive(Debug, Clone)]
pub struct NewInvoiceRecord {
    pub seller_name: String,
    pub seller: SellerDetails,
    pub invoice_number: String,
    pub organization_id: Uuid,
    pub seller_gstin: Option<String>,
    pub purchase_amount: Decimal,
    pub purchase_date: NaiveDate,
    pub gst_applicable: bool,
    pub gst_rate: Option<Decimal>,
    pub gst_amount: Option<Decimal>,
    pub reverse_charge_applicable: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewVehicleRecord {
    pub invoice_id: Uuid,
    pub organization_id: Uuid,
    pub owner_name: String,
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model_name: String,
    pub variant: String,
    pub fuel_type: FuelType,
    pub registration_number: String,
    pub chassis_number: String,
    pub engine_number: String,
    pub color: String,
    pub year_of_manufacture: i32,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseDocumentRecord {
    pub invoice_id: Uuid,
    pub vechile_invoice_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub slot: String,
    pub url: String,
    pub storage_key: String,
    pub provider: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_by: Uuid,
}

// Decompõe a união do vendedor nas colunas anuláveis do subtipo.
// Colunas do outro subtipo ficam NULL.
fn seller_columns(
    seller: &SellerDetails,
) -> (
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<crate::models::invoice::LeadSource>,
    Option<&str>,
    Option<NaiveDate>,
    Option<&str>,
    Option<&str>,
) {
    match seller {
        SellerDetails::Direct {
            mobile,
            email,
            aadhaar_number,
            pan_number,
            lead_source,
        } => (
            Some(mobile.as_str()),
            Some(email.as_str()),
            Some(aadhaar_number.as_str()),
            Some(pan_number.as_str()),
            Some(*lead_source),
            None,
            None,
            None,
            None,
        ),
        SellerDetails::Mstc {
            auction_number,
            auction_date,
            source,
            lot_number,
        } => (
            None,
            None,
            None,
            None,
            None,
            Some(auction_number.as_str()),
            Some(*auction_date),
            Some(source.as_str()),
            Some(lot_number.as_str()),
        ),
        SellerDetails::Gem => (None, None, None, None, None, None, None, None, None),
    }
}

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Notas fiscais ---

    pub async fn create(&self, record: &NewInvoiceRecord) -> Result<Invoice, AppError> {
        let (mobile, email, aadhaar, pan, lead_source, auction_number, auction_date, source, lot_number) =
            seller_columns(&record.seller);

        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                seller_name, seller_type, invoice_number, organization_id, seller_gstin,
                purchase_amount, purchase_date, gst_applicable, gst_rate, gst_amount,
                reverse_charge_applicable,
                mobile, email, aadhaar_number, pan_number, lead_source,
                auction_number, auction_date, source, lot_number,
                created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $21)
            RETURNING *
            "#,
        )
        .bind(&record.seller_name)
        .bind(record.seller.seller_type())
        .bind(&record.invoice_number)
        .bind(record.organization_id)
        .bind(record.seller_gstin.as_deref())
        .bind(record.purchase_amount)
        .bind(record.purchase_date)
        .bind(record.gst_applicable)
        .bind(record.gst_rate)
        .bind(record.gst_amount)
        .bind(record.reverse_charge_applicable)
        .bind(mobile)
        .bind(email)
        .bind(aadhaar)
        .bind(pan)
        .bind(lead_source)
        .bind(auction_number)
        .bind(auction_date)
        .bind(source)
        .bind(lot_number)
        .bind(record.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Invoice with this number already exists");
                }
            }
            e.into()
        })
    }

    // Notas apagadas logicamente nunca saem das leituras.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    pub async fn find_paginated(
        &self,
        organization_id: Option<Uuid>,
        status: Option<InvoiceStatus>,
        seller_type: Option<SellerType>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Invoice>, i64), AppError> {
        let offset = offset(page, limit);
        let data = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE is_deleted = FALSE
              AND ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::invoice_status IS NULL OR status = $2)
              AND ($3::seller_type IS NULL OR seller_type = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(organization_id)
        .bind(status)
        .bind(seller_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM invoices
            WHERE is_deleted = FALSE
              AND ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::invoice_status IS NULL OR status = $2)
              AND ($3::seller_type IS NULL OR seller_type = $3)
            "#,
        )
        .bind(organization_id)
        .bind(status)
        .bind(seller_type)
        .fetch_one(&self.pool)
        .await?;

        Ok((data, total))
    }

    // Reescreve os campos editáveis e TODAS as colunas de subtipo,
    // para que uma troca de sellerType não deixe resíduo do subtipo anterior.
    pub async fn update(&self, id: Uuid, record: &NewInvoiceRecord) -> Result<Option<Invoice>, AppError> {
        let (mobile, email, aadhaar, pan, lead_source, auction_number, auction_date, source, lot_number) =
            seller_columns(&record.seller);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET seller_name = $2,
                seller_type = $3,
                seller_gstin = $4,
                purchase_amount = $5,
                purchase_date = $6,
                gst_applicable = $7,
                gst_rate = $8,
                gst_amount = $9,
                reverse_charge_applicable = $10,
                mobile = $11,
                email = $12,
                aadhaar_number = $13,
                pan_number = $14,
                lead_source = $15,
                auction_number = $16,
                auction_date = $17,
                source = $18,
                lot_number = $19,
                updated_by = $20,
                updated_at = now()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.seller_name)
        .bind(record.seller.seller_type())
        .bind(record.seller_gstin.as_deref())
        .bind(record.purchase_amount)
        .bind(record.purchase_date)
        .bind(record.gst_applicable)
        .bind(record.gst_rate)
        .bind(record.gst_amount)
        .bind(record.reverse_charge_applicable)
        .bind(mobile)
        .bind(email)
        .bind(aadhaar)
        .bind(pan)
        .bind(lead_source)
        .bind(auction_number)
        .bind(auction_date)
        .bind(source)
        .bind(lot_number)
        .bind(record.created_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    pub async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET is_deleted = TRUE, deleted_at = now(), deleted_by = $2, updated_at = now()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Remoção física só para rascunhos; documentos órfãos caem junto.
    pub async fn hard_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM purchase_documents WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Sub-notas de veículo ---

    // Inserir o veículo e confirmar a nota são um ato atômico: ou os dois
    // acontecem, ou nenhum. As UNIQUEs do banco arbitram corridas.
    pub async fn create_vehicle_and_confirm(
        &self,
        record: &NewVehicleRecord,
    ) -> Result<VehicleInvoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let vehicle = sqlx::query_as::<_, VehicleInvoice>(
            r#"
            INSERT INTO vehicle_invoices (
                invoice_id, organization_id, owner_name, vehicle_type, make, model_name,
                variant, fuel_type, registration_number, chassis_number, engine_number,
                color, year_of_manufacture, purchase_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(record.invoice_id)
        .bind(record.organization_id)
        .bind(&record.owner_name)
        .bind(record.vehicle_type)
        .bind(&record.make)
        .bind(&record.model_name)
        .bind(&record.variant)
        .bind(record.fuel_type)
        .bind(&record.registration_number)
        .bind(&record.chassis_number)
        .bind(&record.engine_number)
        .bind(&record.color)
        .bind(record.year_of_manufacture)
        .bind(record.purchase_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("vehicle_invoices_invoice_id_key") => {
                            AppError::bad_request("Other vehicle exist in this invoice")
                        }
                        _ => AppError::conflict(
                            "Vehicle with this registration number already exists",
                        ),
                    };
                }
            }
            e.into()
        })?;

        sqlx::query(
            "UPDATE invoices SET status = 'CONFIRMED', updated_at = now() WHERE id = $1",
        )
        .bind(record.invoice_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(vehicle)
    }

    pub async fn find_vehicle_by_id(&self, id: Uuid) -> Result<Option<VehicleInvoice>, AppError> {
        let vehicle = sqlx::query_as::<_, VehicleInvoice>(
            "SELECT * FROM vehicle_invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    pub async fn find_vehicle_by_invoice_id(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<VehicleInvoice>, AppError> {
        let vehicle = sqlx::query_as::<_, VehicleInvoice>(
            "SELECT * FROM vehicle_invoices WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    pub async fn find_vehicles_paginated(
        &self,
        organization_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<VehicleInvoice>, i64), AppError> {
        let offset = offset(page, limit);
        let data = sqlx::query_as::<_, VehicleInvoice>(
            r#"
            SELECT * FROM vehicle_invoices
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vehicle_invoices WHERE ($1::uuid IS NULL OR organization_id = $1)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((data, total))
    }

    pub async fn update_vehicle(
        &self,
        id: Uuid,
        record: &NewVehicleRecord,
    ) -> Result<Option<VehicleInvoice>, AppError> {
        let vehicle = sqlx::query_as::<_, VehicleInvoice>(
            r#"
            UPDATE vehicle_invoices
            SET owner_name = $2,
                vehicle_type = $3,
                make = $4,
                model_name = $5,
                variant = $6,
                fuel_type = $7,
                registration_number = $8,
                chassis_number = $9,
                engine_number = $10,
                color = $11,
                year_of_manufacture = $12,
                purchase_date = $13,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.owner_name)
        .bind(record.vehicle_type)
        .bind(&record.make)
        .bind(&record.model_name)
        .bind(&record.variant)
        .bind(record.fuel_type)
        .bind(&record.registration_number)
        .bind(&record.chassis_number)
        .bind(&record.engine_number)
        .bind(&record.color)
        .bind(record.year_of_manufacture)
        .bind(record.purchase_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::conflict(
                        "Vehicle with this registration number already exists",
                    );
                }
            }
            AppError::from(e)
        })?;
        Ok(vehicle)
    }

    // Remover o veículo derruba tudo o que depende dele (peças, COD,
    // documentos) e marca a nota pai como apagada, na mesma transação.
    pub async fn delete_vehicle_cascade(
        &self,
        vehicle_id: Uuid,
        invoice_id: Uuid,
        deleted_by: Uuid,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM inventory WHERE vechile_id = $1")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM vehicle_cod_records WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM purchase_documents WHERE vechile_invoice_id = $1")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM vehicle_invoices WHERE id = $1")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET is_deleted = TRUE, deleted_at = now(), deleted_by = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(deleted_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Documentos de compra ---

    pub async fn create_purchase_document(
        &self,
        record: &NewPurchaseDocumentRecord,
    ) -> Result<PurchaseDocument, AppError> {
        let doc = sqlx::query_as::<_, PurchaseDocument>(
            r#"
            INSERT INTO purchase_documents (
                invoice_id, vechile_invoice_id, organization_id, slot, url, storage_key,
                provider, file_name, mime_type, size, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(record.invoice_id)
        .bind(record.vechile_invoice_id)
        .bind(record.organization_id)
        .bind(&record.slot)
        .bind(&record.url)
        .bind(&record.storage_key)
        .bind(&record.provider)
        .bind(&record.file_name)
        .bind(&record.mime_type)
        .bind(record.size)
        .bind(record.uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(doc)
    }

    pub async fn find_documents_by_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<PurchaseDocument>, AppError> {
        let docs = sqlx::query_as::<_, PurchaseDocument>(
            "SELECT * FROM purchase_documents WHERE invoice_id = $1 ORDER BY created_at DESC",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }
}
