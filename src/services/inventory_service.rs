// src/services/inventory_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{get_pagination, PaginatedResponse, MAX_LIMIT},
        security::sanitize_string,
    },
    db::{
        inventory_repo::{InventoryFilter, InventoryLineUpdate, NewInventoryLine},
        InventoryRepository, InvoiceRepository,
    },
    models::{
        auth::Claims,
        inventory::{
            Condition, CreateInventoryBatchPayload, InventoryItem, InventoryListQuery, PartStatus,
            UpdateInventoryPayload,
        },
        user::Role,
    },
};

// --- Regras de estoque, puras e testáveis ---

pub fn derive_available(opening_stock: i64, quantity_received: i64, quantity_issued: i64) -> i64 {
    opening_stock + quantity_received - quantity_issued
}

pub fn validate_quantities(
    opening_stock: i64,
    quantity_received: i64,
    quantity_issued: i64,
    condition: Condition,
) -> Result<(), AppError> {
    if opening_stock < 0 || quantity_received < 0 || quantity_issued < 0 {
        return Err(AppError::bad_request("Quantities cannot be negative"));
    }
    if quantity_issued > opening_stock + quantity_received {
        return Err(AppError::bad_request(
            "Issued quantity cannot exceed opening stock plus received quantity",
        ));
    }
    if condition == Condition::Damaged && quantity_issued > 0 {
        return Err(AppError::bad_request("Damaged parts cannot be issued"));
    }
    Ok(())
}

// Prioridade: DAMAGED ganha de tudo, depois esgotado, depois venda parcial.
pub fn derive_status(condition: Condition, available_quantity: i64, quantity_issued: i64) -> PartStatus {
    if condition == Condition::Damaged {
        PartStatus::DamageOnly
    } else if available_quantity <= 0 {
        PartStatus::SoldOut
    } else if quantity_issued > 0 {
        PartStatus::PartialSold
    } else {
        PartStatus::Available
    }
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    invoice_repo: InvoiceRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, invoice_repo: InvoiceRepository) -> Self {
        Self {
            inventory_repo,
            invoice_repo,
        }
    }

    fn scope_org(actor: &Claims) -> Option<Uuid> {
        match actor.role {
            Role::SuperAdmin => None,
            _ => actor.org_id,
        }
    }

    // O desmonte de um veículo acontece uma única vez: o lote inteiro entra
    // numa transação que tranca o veículo e o vira para DISMANTLED.
    pub async fn create_batch(
        &self,
        payload: CreateInventoryBatchPayload,
        actor: &Claims,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let vehicle = self
            .invoice_repo
            .find_vehicle_by_id(payload.vechile_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        if let Some(org) = Self::scope_org(actor) {
            if vehicle.organization_id != org {
                return Err(AppError::not_found("Vehicle not found"));
            }
        }
        let invoice = self
            .invoice_repo
            .find_by_id(vehicle.invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice not found"))?;

        let mut lines = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            validate_quantities(
                item.opening_stock,
                item.quantity_received,
                item.quantity_issued,
                item.condition,
            )?;
            let available =
                derive_available(item.opening_stock, item.quantity_received, item.quantity_issued);
            lines.push(NewInventoryLine {
                part_name: sanitize_string(&item.part_name),
                part_type: item.part_type,
                opening_stock: item.opening_stock,
                quantity_received: item.quantity_received,
                quantity_issued: item.quantity_issued,
                available_quantity: available,
                unit_price: item.unit_price,
                condition: item.condition,
                status: derive_status(item.condition, available, item.quantity_issued),
                documents: item.documents.clone(),
            });
        }

        self.inventory_repo
            .create_batch(
                vehicle.id,
                invoice.id,
                &invoice.invoice_number,
                &vehicle.model_name,
                actor.sub,
                &lines,
            )
            .await
    }

    pub async fn get(&self, id: Uuid, actor: &Claims) -> Result<InventoryItem, AppError> {
        let item = self
            .inventory_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Inventory item not found"))?;
        self.check_scope(&item, actor).await?;
        Ok(item)
    }

    async fn check_scope(&self, item: &InventoryItem, actor: &Claims) -> Result<(), AppError> {
        if let Some(org) = Self::scope_org(actor) {
            let vehicle = self
                .invoice_repo
                .find_vehicle_by_id(item.vechile_id)
                .await?
                .ok_or_else(|| AppError::not_found("Inventory item not found"))?;
            if vehicle.organization_id != org {
                return Err(AppError::not_found("Inventory item not found"));
            }
        }
        Ok(())
    }

    // Sem parâmetros de paginação a listagem devolve a primeira página
    // cheia (limite máximo), nunca a tabela inteira.
    pub async fn list(
        &self,
        query: InventoryListQuery,
        actor: &Claims,
    ) -> Result<PaginatedResponse<InventoryItem>, AppError> {
        let (page, limit) = if query.page.is_none() && query.limit.is_none() {
            (1, MAX_LIMIT)
        } else {
            get_pagination(query.page, query.limit)
        };

        let filter = InventoryFilter {
            organization_id: Self::scope_org(actor),
            vechile_id: query.vechile_id,
            invoice_id: query.invoice_id,
            part_type: query.part_type,
            status: query.status,
            condition: query.condition,
        };
        let (data, total) = self.inventory_repo.find_paginated(&filter, page, limit).await?;
        Ok(PaginatedResponse::new(data, page, limit, total))
    }

    // Atualização parcial: o estado final é remontado sobre a linha atual
    // e o conjunto inteiro de invariantes roda de novo.
    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateInventoryPayload,
        actor: &Claims,
    ) -> Result<InventoryItem, AppError> {
        let current = self.get(id, actor).await?;

        let opening_stock = payload.opening_stock.unwrap_or(current.opening_stock);
        let quantity_received = payload.quantity_received.unwrap_or(current.quantity_received);
        let quantity_issued = payload.quantity_issued.unwrap_or(current.quantity_issued);
        let condition = payload.condition.unwrap_or(current.condition);
        let unit_price = match payload.unit_price {
            Some(price) => Some(price),
            None => current.unit_price,
        };

        // Preço unitário só muda junto com uma saída de peça: ele registra
        // o valor praticado na venda, não uma reavaliação do estoque parado.
        if let Some(new_price) = payload.unit_price {
            if current.unit_price != Some(new_price) && quantity_issued <= current.quantity_issued {
                return Err(AppError::bad_request(
                    "Unit price can only be changed when issuing parts",
                ));
            }
        }

        validate_quantities(opening_stock, quantity_received, quantity_issued, condition)?;
        let available = derive_available(opening_stock, quantity_received, quantity_issued);

        let update = InventoryLineUpdate {
            part_name: payload
                .part_name
                .as_deref()
                .map(sanitize_string)
                .unwrap_or_else(|| current.part_name.clone()),
            part_type: payload.part_type.unwrap_or(current.part_type),
            opening_stock,
            quantity_received,
            quantity_issued,
            available_quantity: available,
            unit_price,
            condition,
            status: derive_status(condition, available, quantity_issued),
            documents: payload
                .documents
                .unwrap_or_else(|| current.documents.0.clone()),
            updated_by: actor.sub,
        };

        self.inventory_repo
            .update_by_id(id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Inventory item not found"))
    }

    pub async fn delete(&self, id: Uuid, actor: &Claims) -> Result<(), AppError> {
        self.get(id, actor).await?;
        let removed = self.inventory_repo.delete_by_id(id).await?;
        if !removed {
            return Err(AppError::not_found("Inventory item not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_is_opening_plus_received_minus_issued() {
        assert_eq!(derive_available(4, 2, 3), 3);
        assert_eq!(derive_available(0, 5, 5), 0);
    }

    #[test]
    fn issued_cannot_exceed_stock() {
        assert!(validate_quantities(2, 1, 4, Condition::Used).is_err());
        assert!(validate_quantities(2, 1, 3, Condition::Used).is_ok());
    }

    #[test]
    fn damaged_parts_cannot_be_issued() {
        assert!(validate_quantities(5, 0, 1, Condition::Damaged).is_err());
        assert!(validate_quantities(5, 0, 0, Condition::Damaged).is_ok());
    }

    #[test]
    fn negative_quantities_are_rejected() {
        assert!(validate_quantities(-1, 0, 0, Condition::New).is_err());
        assert!(validate_quantities(0, -1, 0, Condition::New).is_err());
    }

    #[test]
    fn status_priority_damage_first() {
        // DAMAGED vence mesmo com estoque disponível
        assert_eq!(derive_status(Condition::Damaged, 5, 0), PartStatus::DamageOnly);
        assert_eq!(derive_status(Condition::Used, 0, 5), PartStatus::SoldOut);
        assert_eq!(derive_status(Condition::Used, 3, 2), PartStatus::PartialSold);
        assert_eq!(derive_status(Condition::New, 5, 0), PartStatus::Available);
    }
}
