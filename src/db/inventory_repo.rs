// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::offset},
    models::inventory::{Condition, InventoryAttachment, InventoryItem, PartStatus, PartType},
};

// Linha de peça já validada pelo serviço (quantidades coerentes, status derivado).
#[derive(Debug, Clone)]
pub struct NewInventoryLine {
    pub part_name: String,
    pub part_type: PartType,
    pub opening_stock: i64,
    pub quantity_received: i64,
    pub quantity_issued: i64,
    pub available_quantity: i64,
    pub unit_price: Option<Decimal>,
    pub condition: Condition,
    pub status: PartStatus,
    pub documents: Vec<InventoryAttachment>,
}

// Estado recalculado de uma peça existente.
#[derive(Debug, Clone)]
pub struct InventoryLineUpdate {
    pub part_name: String,
    pub part_type: PartType,
    pub opening_stock: i64,
    pub quantity_received: i64,
    pub quantity_issued: i64,
    pub available_quantity: i64,
    pub unit_price: Option<Decimal>,
    pub condition: Condition,
    pub status: PartStatus,
    pub documents: Vec<InventoryAttachment>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    // Recorte por organização, resolvido via veículo dono da peça.
    pub organization_id: Option<Uuid>,
    pub vechile_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub part_type: Option<PartType>,
    pub status: Option<PartStatus>,
    pub condition: Option<Condition>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Criação do lote de desmonte. Tudo numa transação:
    //   1. tranca a linha do veículo (FOR UPDATE) para serializar tentativas;
    //   2. rejeita se o veículo já tem peças;
    //   3. insere as linhas e vira o veículo para DISMANTLED.
    pub async fn create_batch(
        &self,
        vechile_id: Uuid,
        invoice_id: Uuid,
        purchase_invoice_number: &str,
        vechile_model: &str,
        created_by: Uuid,
        lines: &[NewInventoryLine],
    ) -> Result<Vec<InventoryItem>, AppError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM vehicle_invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(vechile_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(AppError::not_found("Vehicle not found"));
        }

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE vechile_id = $1")
                .bind(vechile_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing > 0 {
            return Err(AppError::bad_request("Dismantling already completed"));
        }

        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            let item = sqlx::query_as::<_, InventoryItem>(
                r#"
                INSERT INTO inventory (
                    invoice_id, vechile_id, purchase_invoice_number, vechile_model,
                    part_name, part_type, opening_stock, quantity_received,
                    quantity_issued, available_quantity, unit_price, condition,
                    status, documents, created_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING *
                "#,
            )
            .bind(invoice_id)
            .bind(vechile_id)
            .bind(purchase_invoice_number)
            .bind(vechile_model)
            .bind(&line.part_name)
            .bind(line.part_type)
            .bind(line.opening_stock)
            .bind(line.quantity_received)
            .bind(line.quantity_issued)
            .bind(line.available_quantity)
            .bind(line.unit_price)
            .bind(line.condition)
            .bind(line.status)
            .bind(Json(&line.documents))
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;
            created.push(item);
        }

        sqlx::query(
            "UPDATE vehicle_invoices SET vechicle_status = 'DISMANTLED', updated_at = now() WHERE id = $1",
        )
        .bind(vechile_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn exists_by_vehicle_id(&self, vechile_id: Uuid) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE vechile_id = $1")
            .bind(vechile_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn find_paginated(
        &self,
        filter: &InventoryFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<InventoryItem>, i64), AppError> {
        let offset = offset(page, limit);
        let data = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT i.* FROM inventory i
            JOIN vehicle_invoices v ON v.id = i.vechile_id
            WHERE ($1::uuid IS NULL OR v.organization_id = $1)
              AND ($2::uuid IS NULL OR i.vechile_id = $2)
              AND ($3::uuid IS NULL OR i.invoice_id = $3)
              AND ($4::part_type IS NULL OR i.part_type = $4)
              AND ($5::part_status IS NULL OR i.status = $5)
              AND ($6::part_condition IS NULL OR i.condition = $6)
            ORDER BY i.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.vechile_id)
        .bind(filter.invoice_id)
        .bind(filter.part_type)
        .bind(filter.status)
        .bind(filter.condition)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM inventory i
            JOIN vehicle_invoices v ON v.id = i.vechile_id
            WHERE ($1::uuid IS NULL OR v.organization_id = $1)
              AND ($2::uuid IS NULL OR i.vechile_id = $2)
              AND ($3::uuid IS NULL OR i.invoice_id = $3)
              AND ($4::part_type IS NULL OR i.part_type = $4)
              AND ($5::part_status IS NULL OR i.status = $5)
              AND ($6::part_condition IS NULL OR i.condition = $6)
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.vechile_id)
        .bind(filter.invoice_id)
        .bind(filter.part_type)
        .bind(filter.status)
        .bind(filter.condition)
        .fetch_one(&self.pool)
        .await?;

        Ok((data, total))
    }

    pub async fn update_by_id(
        &self,
        id: Uuid,
        update: &InventoryLineUpdate,
    ) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory
            SET part_name = $2,
                part_type = $3,
                opening_stock = $4,
                quantity_received = $5,
                quantity_issued = $6,
                available_quantity = $7,
                unit_price = $8,
                condition = $9,
                status = $10,
                documents = $11,
                updated_by = $12,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.part_name)
        .bind(update.part_type)
        .bind(update.opening_stock)
        .bind(update.quantity_received)
        .bind(update.quantity_issued)
        .bind(update.available_quantity)
        .bind(update.unit_price)
        .bind(update.condition)
        .bind(update.status)
        .bind(Json(&update.documents))
        .bind(update.updated_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
