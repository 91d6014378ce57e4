// src/services/invoice_service.rs

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::PaginatedResponse,
        security::{is_valid_email, sanitize_opt, sanitize_string},
    },
    db::{
        invoice_repo::{NewInvoiceRecord, NewPurchaseDocumentRecord, NewVehicleRecord},
        InvoiceRepository, OrganizationRepository,
    },
    models::{
        auth::Claims,
        invoice::{
            CreateInvoicePayload, CreateVehiclePayload, Invoice, InvoiceStatus, PurchaseDocument,
            SellerDetails, SellerType, VechicleStatus, VehicleInvoice,
        },
        user::Role,
    },
    services::storage_service::StoragePort,
};

// Slots aceitos de documento de compra.
const DOCUMENT_SLOTS: &[&str] = &["rc", "ownerId", "otherDocument"];

// CONFIRMED congela a nota e tudo que pende dela: nenhum update de
// veículo passa com a nota-mãe confirmada. O desmonte congela o veículo
// por conta própria.
fn vehicle_update_gate(
    invoice_status: InvoiceStatus,
    vehicle_status: VechicleStatus,
) -> Result<(), AppError> {
    if invoice_status == InvoiceStatus::Confirmed {
        return Err(AppError::bad_request("Cannot update a confirmed invoice"));
    }
    if vehicle_status != VechicleStatus::Purchased {
        return Err(AppError::bad_request(
            "Vehicle cannot be updated after dismantling",
        ));
    }
    Ok(())
}

// Número vindo do cliente é respeitado; sem ele, o servidor gera um
// único por construção (millis da época). Duplicata cai na UNIQUE.
fn resolve_invoice_number(requested: Option<&str>) -> String {
    match requested {
        Some(n) if !n.trim().is_empty() => sanitize_string(n),
        _ => format!("INV-{}", Utc::now().timestamp_millis()),
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    org_repo: OrganizationRepository,
    storage: Arc<dyn StoragePort>,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: InvoiceRepository,
        org_repo: OrganizationRepository,
        storage: Arc<dyn StoragePort>,
    ) -> Self {
        Self {
            invoice_repo,
            org_repo,
            storage,
        }
    }

    // Escopo de leitura: SUPER_ADMIN enxerga tudo, o resto só a própria organização.
    fn scope_org(actor: &Claims) -> Option<Uuid> {
        match actor.role {
            Role::SuperAdmin => None,
            _ => actor.org_id,
        }
    }

    fn actor_org(actor: &Claims) -> Result<Uuid, AppError> {
        actor
            .org_id
            .ok_or_else(|| AppError::forbidden("Actor has no organization"))
    }

    fn sanitize_seller(seller: SellerDetails) -> Result<SellerDetails, AppError> {
        match seller {
            SellerDetails::Direct {
                mobile,
                email,
                aadhaar_number,
                pan_number,
                lead_source,
            } => {
                let email = sanitize_string(&email).to_lowercase();
                if !is_valid_email(&email) {
                    return Err(AppError::bad_request("Invalid seller email"));
                }
                Ok(SellerDetails::Direct {
                    mobile: sanitize_string(&mobile),
                    email,
                    aadhaar_number: sanitize_string(&aadhaar_number),
                    pan_number: sanitize_string(&pan_number).to_uppercase(),
                    lead_source,
                })
            }
            SellerDetails::Mstc {
                auction_number,
                auction_date,
                source,
                lot_number,
            } => Ok(SellerDetails::Mstc {
                auction_number: sanitize_string(&auction_number),
                auction_date,
                source: sanitize_string(&source),
                lot_number: sanitize_string(&lot_number),
            }),
            SellerDetails::Gem => Ok(SellerDetails::Gem),
        }
    }

    fn check_gst(payload: &CreateInvoicePayload) -> Result<(), AppError> {
        if payload.gst_applicable && payload.gst_rate.is_none() {
            return Err(AppError::bad_request(
                "GST rate is required when GST is applicable",
            ));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        payload: CreateInvoicePayload,
        actor: &Claims,
    ) -> Result<Invoice, AppError> {
        let org_id = Self::actor_org(actor)?;
        let org = self
            .org_repo
            .find_by_id(org_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))?;
        if !org.is_active {
            return Err(AppError::bad_request("Organization is inactive"));
        }
        Self::check_gst(&payload)?;

        let record = NewInvoiceRecord {
            seller_name: sanitize_string(&payload.seller_name),
            seller: Self::sanitize_seller(payload.seller)?,
            invoice_number: resolve_invoice_number(payload.invoice_number.as_deref()),
            organization_id: org_id,
            seller_gstin: sanitize_opt(payload.seller_gstin.as_deref()),
            purchase_amount: payload.purchase_amount,
            purchase_date: payload.purchase_date,
            gst_applicable: payload.gst_applicable,
            gst_rate: payload.gst_rate,
            gst_amount: payload.gst_amount,
            reverse_charge_applicable: payload.reverse_charge_applicable,
            created_by: actor.sub,
        };

        self.invoice_repo.create(&record).await
    }

    pub async fn get(&self, id: Uuid, actor: &Claims) -> Result<Invoice, AppError> {
        let invoice = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if invoice.organization_id != org {
                return Err(AppError::not_found("Invoice not found"));
            }
        }
        Ok(invoice)
    }

    pub async fn list(
        &self,
        actor: &Claims,
        status: Option<InvoiceStatus>,
        seller_type: Option<SellerType>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<Invoice>, AppError> {
        let (data, total) = self
            .invoice_repo
            .find_paginated(Self::scope_org(actor), status, seller_type, page, limit)
            .await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    // Uma vez confirmada (veículo anexado), a nota congela.
    pub async fn update(
        &self,
        id: Uuid,
        payload: CreateInvoicePayload,
        actor: &Claims,
    ) -> Result<Invoice, AppError> {
        let current = self.get(id, actor).await?;
        if current.status == InvoiceStatus::Confirmed {
            return Err(AppError::bad_request("Cannot update a confirmed invoice"));
        }
        Self::check_gst(&payload)?;

        let record = NewInvoiceRecord {
            seller_name: sanitize_string(&payload.seller_name),
            seller: Self::sanitize_seller(payload.seller)?,
            invoice_number: current.invoice_number.clone(),
            organization_id: current.organization_id,
            seller_gstin: sanitize_opt(payload.seller_gstin.as_deref()),
            purchase_amount: payload.purchase_amount,
            purchase_date: payload.purchase_date,
            gst_applicable: payload.gst_applicable,
            gst_rate: payload.gst_rate,
            gst_amount: payload.gst_amount,
            reverse_charge_applicable: payload.reverse_charge_applicable,
            created_by: actor.sub,
        };

        self.invoice_repo
            .update(id, &record)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice not found"))
    }

    // Rascunho some de verdade; nota confirmada vira remoção lógica,
    // preservando o histórico fiscal.
    pub async fn delete(&self, id: Uuid, actor: &Claims) -> Result<(), AppError> {
        let current = self.get(id, actor).await?;
        let removed = match current.status {
            InvoiceStatus::Draft => self.invoice_repo.hard_delete(id).await?,
            InvoiceStatus::Confirmed => self.invoice_repo.soft_delete(id, actor.sub).await?,
        };
        if !removed {
            return Err(AppError::not_found("Invoice not found"));
        }
        Ok(())
    }

    // --- Veículos ---

    pub async fn create_vehicle(
        &self,
        payload: CreateVehiclePayload,
        actor: &Claims,
    ) -> Result<VehicleInvoice, AppError> {
        let invoice = self.get(payload.invoice_id, actor).await?;
        // Nota confirmada já tem o seu veículo; a UNIQUE no banco arbitra
        // a corrida entre duas criações simultâneas.
        if invoice.status == InvoiceStatus::Confirmed {
            return Err(AppError::bad_request("Other vehicle exist in this invoice"));
        }

        let record = NewVehicleRecord {
            invoice_id: invoice.id,
            organization_id: invoice.organization_id,
            owner_name: sanitize_string(&payload.owner_name),
            vehicle_type: payload.vehicle_type,
            make: sanitize_string(&payload.make),
            model_name: sanitize_string(&payload.model_name),
            variant: sanitize_string(&payload.variant),
            fuel_type: payload.fuel_type,
            registration_number: sanitize_string(&payload.registration_number).to_uppercase(),
            chassis_number: sanitize_string(&payload.chassis_number).to_uppercase(),
            engine_number: sanitize_string(&payload.engine_number).to_uppercase(),
            color: sanitize_string(&payload.color),
            year_of_manufacture: payload.year_of_manufacture,
            purchase_date: payload.purchase_date,
        };

        self.invoice_repo.create_vehicle_and_confirm(&record).await
    }

    pub async fn get_vehicle(&self, id: Uuid, actor: &Claims) -> Result<VehicleInvoice, AppError> {
        let vehicle = self
            .invoice_repo
            .find_vehicle_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if vehicle.organization_id != org {
                return Err(AppError::not_found("Vehicle not found"));
            }
        }
        Ok(vehicle)
    }

    pub async fn list_vehicles(
        &self,
        actor: &Claims,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResponse<VehicleInvoice>, AppError> {
        let (data, total) = self
            .invoice_repo
            .find_vehicles_paginated(Self::scope_org(actor), page, limit)
            .await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    pub async fn update_vehicle(
        &self,
        id: Uuid,
        payload: CreateVehiclePayload,
        actor: &Claims,
    ) -> Result<VehicleInvoice, AppError> {
        let current = self.get_vehicle(id, actor).await?;
        let invoice = self
            .invoice_repo
            .find_by_id(current.invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice not found"))?;
        vehicle_update_gate(invoice.status, current.vechicle_status)?;

        let record = NewVehicleRecord {
            invoice_id: current.invoice_id,
            organization_id: current.organization_id,
            owner_name: sanitize_string(&payload.owner_name),
            vehicle_type: payload.vehicle_type,
            make: sanitize_string(&payload.make),
            model_name: sanitize_string(&payload.model_name),
            variant: sanitize_string(&payload.variant),
            fuel_type: payload.fuel_type,
            registration_number: sanitize_string(&payload.registration_number).to_uppercase(),
            chassis_number: sanitize_string(&payload.chassis_number).to_uppercase(),
            engine_number: sanitize_string(&payload.engine_number).to_uppercase(),
            color: sanitize_string(&payload.color),
            year_of_manufacture: payload.year_of_manufacture,
            purchase_date: payload.purchase_date,
        };

        self.invoice_repo
            .update_vehicle(id, &record)
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle not found"))
    }

    pub async fn delete_vehicle(&self, id: Uuid, actor: &Claims) -> Result<(), AppError> {
        let vehicle = self.get_vehicle(id, actor).await?;
        let removed = self
            .invoice_repo
            .delete_vehicle_cascade(vehicle.id, vehicle.invoice_id, actor.sub)
            .await?;
        if !removed {
            return Err(AppError::not_found("Vehicle not found"));
        }
        Ok(())
    }

    // --- Documentos de compra ---

    pub async fn upload_document(
        &self,
        invoice_id: Uuid,
        slot: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
        actor: &Claims,
    ) -> Result<PurchaseDocument, AppError> {
        if !DOCUMENT_SLOTS.contains(&slot) {
            return Err(AppError::bad_request("Invalid document slot"));
        }
        if bytes.is_empty() {
            return Err(AppError::bad_request("Empty file"));
        }

        let invoice = self.get(invoice_id, actor).await?;
        let vehicle = self.invoice_repo.find_vehicle_by_invoice_id(invoice.id).await?;

        let stored = self.storage.store(bytes, file_name, mime_type).await?;
        let record = NewPurchaseDocumentRecord {
            invoice_id: invoice.id,
            vechile_invoice_id: vehicle.map(|v| v.id),
            organization_id: invoice.organization_id,
            slot: slot.to_string(),
            url: stored.url,
            storage_key: stored.storage_key,
            provider: stored.provider,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: stored.size,
            uploaded_by: actor.sub,
        };
        self.invoice_repo.create_purchase_document(&record).await
    }

    pub async fn list_documents(
        &self,
        invoice_id: Uuid,
        actor: &Claims,
    ) -> Result<Vec<PurchaseDocument>, AppError> {
        // O get aplica o escopo por organização.
        self.get(invoice_id, actor).await?;
        self.invoice_repo.find_documents_by_invoice(invoice_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_parent_blocks_vehicle_update() {
        let err = vehicle_update_gate(InvoiceStatus::Confirmed, VechicleStatus::Purchased)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn dismantled_vehicle_blocks_update_even_on_draft_parent() {
        let err = vehicle_update_gate(InvoiceStatus::Draft, VechicleStatus::Dismantled)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn draft_parent_with_purchased_vehicle_passes_gate() {
        assert!(vehicle_update_gate(InvoiceStatus::Draft, VechicleStatus::Purchased).is_ok());
    }

    #[test]
    fn client_invoice_number_is_kept_and_absent_one_is_generated() {
        assert_eq!(resolve_invoice_number(Some("NF-2025-017")), "NF-2025-017");
        assert!(resolve_invoice_number(None).starts_with("INV-"));
        assert!(resolve_invoice_number(Some("   ")).starts_with("INV-"));
    }
}
