use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "part_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartType {
    Engine,
    Body,
    Electrical,
    Transmission,
    Suspension,
    Interior,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "part_condition", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    New,
    Used,
    Refurbished,
    Damaged,
}

// Status derivado: nunca vem do cliente, sempre recalculado na escrita.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "part_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartStatus {
    Available,
    PartialSold,
    SoldOut,
    DamageOnly,
}

// Anexo de uma peça (laudo, foto). Guardado como JSONB na própria linha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAttachment {
    pub url: String,
    pub storage_key: String,
    pub provider: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

// Uma linha por peça desmontada do veículo.
// Invariante: available_quantity = opening_stock + quantity_received - quantity_issued.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub vechile_id: Uuid,
    pub purchase_invoice_number: String,
    pub vechile_model: String,
    pub part_name: String,
    pub part_type: PartType,
    pub opening_stock: i64,
    pub quantity_received: i64,
    pub quantity_issued: i64,
    pub available_quantity: i64,
    pub unit_price: Option<Decimal>,
    pub condition: Condition,
    pub status: PartStatus,
    pub documents: Json<Vec<InventoryAttachment>>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads de entrada ---

// Uma linha do lote de desmonte. availableQuantity e status nunca
// vêm do cliente: são derivados no serviço.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLinePayload {
    #[validate(length(min = 1, max = 150))]
    pub part_name: String,
    pub part_type: PartType,
    #[validate(range(min = 0))]
    pub opening_stock: i64,
    #[validate(range(min = 0))]
    pub quantity_received: i64,
    #[validate(range(min = 0))]
    pub quantity_issued: i64,
    pub unit_price: Option<Decimal>,
    pub condition: Condition,
    #[serde(default)]
    pub documents: Vec<InventoryAttachment>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryBatchPayload {
    pub vechile_id: Uuid,
    #[validate(length(min = 1), nested)]
    pub items: Vec<InventoryLinePayload>,
}

// Atualização parcial: o estado final é remontado sobre a linha atual
// e revalidado por inteiro.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryPayload {
    #[validate(length(min = 1, max = 150))]
    pub part_name: Option<String>,
    pub part_type: Option<PartType>,
    #[validate(range(min = 0))]
    pub opening_stock: Option<i64>,
    #[validate(range(min = 0))]
    pub quantity_received: Option<i64>,
    #[validate(range(min = 0))]
    pub quantity_issued: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub condition: Option<Condition>,
    pub documents: Option<Vec<InventoryAttachment>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub vechile_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub part_type: Option<PartType>,
    pub status: Option<PartStatus>,
    pub condition: Option<Condition>,
}
