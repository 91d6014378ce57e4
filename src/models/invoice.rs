use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;
use validator::Validate;

// --- Enums do ciclo de vida ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seller_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellerType {
    Direct,
    Mstc,
    Gem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadSource {
    WalkIn,
    Referral,
    Online,
    Agent,
    Other,
}

// --- União fechada por tipo de vendedor ---
// O discriminante `sellerType` decide quais campos existem; a validação é
// um match na tag, nunca herança.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sellerType")]
pub enum SellerDetails {
    #[serde(rename = "DIRECT", rename_all = "camelCase")]
    Direct {
        mobile: String,
        email: String,
        aadhaar_number: String,
        pan_number: String,
        lead_source: LeadSource,
    },
    #[serde(rename = "MSTC", rename_all = "camelCase")]
    Mstc {
        auction_number: String,
        auction_date: NaiveDate,
        source: String,
        lot_number: String,
    },
    #[serde(rename = "GEM")]
    Gem,
}

impl SellerDetails {
    pub fn seller_type(&self) -> SellerType {
        match self {
            SellerDetails::Direct { .. } => SellerType::Direct,
            SellerDetails::Mstc { .. } => SellerType::Mstc,
            SellerDetails::Gem => SellerType::Gem,
        }
    }
}

// A nota fiscal de compra. Uma linha física por nota; os campos de subtipo
// ficam em colunas anuláveis e são remontados na união `seller`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub seller_name: String,
    #[serde(flatten)]
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
    pub status: InvoiceStatus,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub deleted_by: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn required_column<T>(value: Option<T>, column: &str) -> Result<T, sqlx::Error> {
    value.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("coluna obrigatória ausente para o subtipo: {column}").into(),
    })
}

impl FromRow<'_, PgRow> for Invoice {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let seller_type: SellerType = row.try_get("seller_type")?;
        let seller = match seller_type {
            SellerType::Direct => SellerDetails::Direct {
                mobile: required_column(row.try_get("mobile")?, "mobile")?,
                email: required_column(row.try_get("email")?, "email")?,
                aadhaar_number: required_column(row.try_get("aadhaar_number")?, "aadhaar_number")?,
                pan_number: required_column(row.try_get("pan_number")?, "pan_number")?,
                lead_source: required_column(row.try_get("lead_source")?, "lead_source")?,
            },
            SellerType::Mstc => SellerDetails::Mstc {
                auction_number: required_column(row.try_get("auction_number")?, "auction_number")?,
                auction_date: required_column(row.try_get("auction_date")?, "auction_date")?,
                source: required_column(row.try_get("source")?, "source")?,
                lot_number: required_column(row.try_get("lot_number")?, "lot_number")?,
            },
            SellerType::Gem => SellerDetails::Gem,
        };

        Ok(Invoice {
            id: row.try_get("id")?,
            seller_name: row.try_get("seller_name")?,
            seller,
            invoice_number: row.try_get("invoice_number")?,
            organization_id: row.try_get("organization_id")?,
            seller_gstin: row.try_get("seller_gstin")?,
            purchase_amount: row.try_get("purchase_amount")?,
            purchase_date: row.try_get("purchase_date")?,
            gst_applicable: row.try_get("gst_applicable")?,
            gst_rate: row.try_get("gst_rate")?,
            gst_amount: row.try_get("gst_amount")?,
            reverse_charge_applicable: row.try_get("reverse_charge_applicable")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            deleted_by: row.try_get("deleted_by")?,
            is_deleted: row.try_get("is_deleted")?,
            deleted_at: row.try_get("deleted_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// --- Veículo comprado sob a nota ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    TwoWheeler,
    ThreeWheeler,
    FourWheeler,
    Commercial,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fuel_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
    Electric,
    Hybrid,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vechicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VechicleStatus {
    Purchased,
    Dismantled,
    Scrapped,
}

// Sub-nota por veículo: 1:1 com a nota pai (UNIQUE em invoice_id).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInvoice {
    pub id: Uuid,
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
    pub vechicle_status: VechicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Metadados de documento de compra (o binário fica no storage externo).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDocument {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

// --- Payloads de entrada ---

// O número da nota é opcional: sem ele, o servidor gera um.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    #[validate(length(min = 3, max = 50))]
    pub invoice_number: Option<String>,
    #[validate(length(min = 2, max = 150))]
    pub seller_name: String,
    #[serde(flatten)]
    pub seller: SellerDetails,
    pub seller_gstin: Option<String>,
    pub purchase_amount: Decimal,
    pub purchase_date: NaiveDate,
    pub gst_applicable: bool,
    pub gst_rate: Option<Decimal>,
    pub gst_amount: Option<Decimal>,
    pub reverse_charge_applicable: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiclePayload {
    pub invoice_id: Uuid,
    #[validate(length(min = 2, max = 150))]
    pub owner_name: String,
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1, max = 100))]
    pub make: String,
    #[validate(length(min = 1, max = 100))]
    pub model_name: String,
    #[validate(length(min = 1, max = 100))]
    pub variant: String,
    pub fuel_type: FuelType,
    #[validate(length(min = 4, max = 20))]
    pub registration_number: String,
    #[validate(length(min = 4, max = 50))]
    pub chassis_number: String,
    #[validate(length(min = 4, max = 50))]
    pub engine_number: String,
    #[validate(length(min = 2, max = 50))]
    pub color: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year_of_manufacture: i32,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<InvoiceStatus>,
    pub seller_type: Option<SellerType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_details_tags_round_trip() {
        let direct: SellerDetails = serde_json::from_value(serde_json::json!({
            "sellerType": "DIRECT",
            "mobile": "9999999999",
            "email": "seller@example.in",
            "aadhaarNumber": "123412341234",
            "panNumber": "ABCDE1234F",
            "leadSource": "WALK_IN",
        }))
        .unwrap();
        assert_eq!(direct.seller_type(), SellerType::Direct);

        let gem: SellerDetails =
            serde_json::from_value(serde_json::json!({ "sellerType": "GEM" })).unwrap();
        assert_eq!(gem, SellerDetails::Gem);
    }

    #[test]
    fn direct_without_required_fields_is_rejected_by_serde() {
        let result: Result<SellerDetails, _> = serde_json::from_value(serde_json::json!({
            "sellerType": "DIRECT",
            "mobile": "9999999999",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn mstc_requires_auction_fields() {
        let result: Result<SellerDetails, _> = serde_json::from_value(serde_json::json!({
            "sellerType": "MSTC",
            "auctionNumber": "AUC-1",
        }));
        assert!(result.is_err());

        let ok: SellerDetails = serde_json::from_value(serde_json::json!({
            "sellerType": "MSTC",
            "auctionNumber": "AUC-1",
            "auctionDate": "2025-06-01",
            "source": "MSTC portal",
            "lotNumber": "LOT-9",
        }))
        .unwrap();
        assert_eq!(ok.seller_type(), SellerType::Mstc);
    }
}
