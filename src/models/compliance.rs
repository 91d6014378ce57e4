use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rto_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RtoStatus {
    NotApplied,
    Applied,
    Deregistered,
    Rejected,
}

// Certificado de Destruição: no máximo um registro por veículo
// (UNIQUE em vehicle_id no banco).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCodRecord {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads de entrada ---

// codGenerated manda: true exige inward + data de emissão,
// false proíbe os dois. A coerência é checada no serviço.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodPayload {
    pub vehicle_id: Uuid,
    // Opcional: quando vem, tem que bater com a nota do veículo.
    pub invoice_id: Option<Uuid>,
    pub cod_generated: bool,
    #[validate(length(min = 1, max = 100))]
    pub cod_inward_number: Option<String>,
    pub cod_issue_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 150))]
    pub rto_office: Option<String>,
    pub rto_status: Option<RtoStatus>,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
    pub cod_document_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCodTrackingPayload {
    #[validate(length(min = 1, max = 150))]
    pub rto_office: Option<String>,
    pub rto_status: Option<RtoStatus>,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
    pub cod_document_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub invoice_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub cod_generated: Option<bool>,
    pub rto_status: Option<RtoStatus>,
}
