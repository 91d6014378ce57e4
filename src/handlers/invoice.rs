// src/handlers/invoice.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{get_pagination, PaginatedResponse, PaginationQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        roles::{RequireRole, StaffOrAbove},
    },
    models::invoice::{
        CreateInvoicePayload, CreateVehiclePayload, Invoice, InvoiceListQuery, PurchaseDocument,
        VehicleInvoice,
    },
};

// --- Notas fiscais ---

pub async fn create_invoice(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<Json<Invoice>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let invoice = app_state
        .invoice_service
        .create(payload, &actor)
        .await
        .map_err(|e| e.into_domain("create_invoice", "Failed to create invoice"))?;
    Ok(Json(invoice))
}

pub async fn list_invoices(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<PaginatedResponse<Invoice>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state
        .invoice_service
        .list(&actor, query.status, query.seller_type, page, limit)
        .await?;
    Ok(Json(response))
}

pub async fn get_invoice(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = app_state.invoice_service.get(id, &actor).await?;
    Ok(Json(invoice))
}

pub async fn update_invoice(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<Json<Invoice>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let invoice = app_state
        .invoice_service
        .update(id, payload, &actor)
        .await
        .map_err(|e| e.into_domain("update_invoice", "Failed to update invoice"))?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.invoice_service.delete(id, &actor).await?;
    Ok(Json(json!({ "message": "Invoice deleted" })))
}

// --- Veículos ---

pub async fn create_vehicle(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<Json<VehicleInvoice>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let vehicle = app_state
        .invoice_service
        .create_vehicle(payload, &actor)
        .await
        .map_err(|e| e.into_domain("create_vehicle", "Failed to create vehicle invoice"))?;
    Ok(Json(vehicle))
}

pub async fn list_vehicles(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<VehicleInvoice>>, AppError> {
    let (page, limit) = get_pagination(query.page, query.limit);
    let response = app_state
        .invoice_service
        .list_vehicles(&actor, page, limit)
        .await?;
    Ok(Json(response))
}

pub async fn get_vehicle(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleInvoice>, AppError> {
    let vehicle = app_state.invoice_service.get_vehicle(id, &actor).await?;
    Ok(Json(vehicle))
}

pub async fn update_vehicle(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<Json<VehicleInvoice>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let vehicle = app_state
        .invoice_service
        .update_vehicle(id, payload, &actor)
        .await
        .map_err(|e| e.into_domain("update_vehicle", "Failed to update vehicle invoice"))?;
    Ok(Json(vehicle))
}

pub async fn delete_vehicle(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.invoice_service.delete_vehicle(id, &actor).await?;
    Ok(Json(json!({ "message": "Vehicle invoice deleted" })))
}

// --- Documentos de compra ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDocumentQuery {
    pub invoice_id: Uuid,
}

// Multipart: o nome do campo é o slot (rc / ownerId / otherDocument),
// um arquivo por slot na mesma requisição.
pub async fn upload_documents(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<PurchaseDocumentQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<PurchaseDocument>>, AppError> {
    let mut uploaded = Vec::new();
    let mut seen_slots: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart body"))?
    {
        let slot = field
            .name()
            .map(String::from)
            .ok_or_else(|| AppError::bad_request("Missing field name"))?;
        if seen_slots.iter().any(|s| s == &slot) {
            return Err(AppError::bad_request("Duplicate document slot in request"));
        }
        let file_name = field
            .file_name()
            .map(String::from)
            .ok_or_else(|| AppError::bad_request("Missing file name"))?;
        let mime_type = field
            .content_type()
            .map(String::from)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file"))?;

        let doc = app_state
            .invoice_service
            .upload_document(query.invoice_id, &slot, &file_name, &mime_type, &bytes, &actor)
            .await?;
        seen_slots.push(slot);
        uploaded.push(doc);
    }

    if uploaded.is_empty() {
        return Err(AppError::bad_request("No files provided"));
    }
    Ok(Json(uploaded))
}

pub async fn list_documents(
    _guard: RequireRole<StaffOrAbove>,
    AuthenticatedUser(actor): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(query): Query<PurchaseDocumentQuery>,
) -> Result<Json<Vec<PurchaseDocument>>, AppError> {
    let docs = app_state
        .invoice_service
        .list_documents(query.invoice_id, &actor)
        .await?;
    Ok(Json(docs))
}
