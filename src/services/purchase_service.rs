// src/services/purchase_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Page},
    },
    db::{Query, Repository},
    models::{
        employee::Role,
        purchase::{
            CreatePurchasePayload, PurchaseFilter, PurchaseLine, PurchaseOrder, PurchaseStatus,
            PurchaseStatusChange, Quotation, QuotationPayload,
        },
        supplier::Supplier,
        Actor,
    },
    services::{inventory_service::InventoryService, invoice_service::InvoiceService},
};

pub const APPROVE_PERMISSION: &str = "purchases:approve";

#[derive(Clone)]
pub struct PurchaseService {
    purchases: Repository<PurchaseOrder>,
    suppliers: Repository<Supplier>,
    inventory_service: InventoryService,
    invoice_service: InvoiceService,
}

impl PurchaseService {
    pub fn new(
        purchases: Repository<PurchaseOrder>,
        suppliers: Repository<Supplier>,
        inventory_service: InventoryService,
        invoice_service: InvoiceService,
    ) -> Self {
        Self { purchases, suppliers, inventory_service, invoice_service }
    }

    pub async fn list(
        &self,
        query: &ListQuery,
        filter: &PurchaseFilter,
    ) -> Result<Page<PurchaseOrder>, AppError> {
        let db_query = match filter.status {
            Some(status) => Query::new().eq("status", status),
            None => Query::new(),
        };
        let mut purchases = self.purchases.find(&db_query).await?;
        purchases.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(query.apply(purchases))
    }

    pub async fn all(&self) -> Result<Vec<PurchaseOrder>, AppError> {
        self.purchases.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<PurchaseOrder, AppError> {
        self.purchases.require(id).await
    }

    // --- REQUISIÇÃO ---
    pub async fn create(
        &self,
        payload: CreatePurchasePayload,
        actor: &Actor,
    ) -> Result<PurchaseOrder, AppError> {
        payload.validate()?;
        if payload.items.is_empty() {
            return Err(AppError::EmptyItems);
        }

        let supplier = match payload.supplier_id {
            Some(id) => Some(self.suppliers.require(id).await?),
            None => None,
        };

        let mut items = Vec::with_capacity(payload.items.len());
        for line in &payload.items {
            let product = self.inventory_service.get_product(line.product_id).await?;
            items.push(PurchaseLine {
                product_id: product.id,
                product_name: product.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total: line.quantity * line.unit_price,
            });
        }

        let now = Utc::now();
        let purchase = PurchaseOrder {
            id: Uuid::new_v4(),
            number: self.purchases.next_number("number").await?,
            supplier_id: supplier.as_ref().map(|s| s.id),
            supplier_name: supplier.map(|s| s.name),
            requester_id: actor.id,
            requester_name: actor.name.clone(),
            total_amount: items.iter().map(|i| i.total).sum::<Decimal>(),
            items,
            quotations: Vec::new(),
            status: PurchaseStatus::Pending,
            status_history: vec![PurchaseStatusChange {
                from: None,
                to: PurchaseStatus::Pending,
                changed_by: actor.clone(),
                changed_at: now,
            }],
            expected_delivery: payload.expected_delivery,
            notes: payload.notes,
            invoice_id: None,
            received_at: None,
            created_at: now,
            updated_at: now,
        };
        self.purchases.create(&purchase).await?;
        tracing::info!("📝 Requisição de compra #{} criada por {}", purchase.number, actor.name);
        Ok(purchase)
    }

    // --- TRANSIÇÕES ---

    /// `role` é o cargo de quem pede a mudança; aprovar exige `purchases:approve`.
    /// O recebimento lança a nota e o estoque antes de gravar o status, e
    /// pode ser repetido depois de uma falha parcial.
    pub async fn update_status(
        &self,
        id: Uuid,
        target: PurchaseStatus,
        actor: &Actor,
        role: Role,
    ) -> Result<PurchaseOrder, AppError> {
        let mut purchase = self.purchases.require(id).await?;

        if !purchase.status.can_transition_to(target) {
            return Err(AppError::InvalidStatusTransition {
                from: purchase.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        if target == PurchaseStatus::Approved && !role.has_permission(APPROVE_PERMISSION) {
            return Err(AppError::Forbidden(APPROVE_PERMISSION.to_string()));
        }

        let now = Utc::now();
        if target == PurchaseStatus::Received {
            let invoice = self.invoice_service.receive_purchase(&purchase, actor).await?;
            purchase.invoice_id = Some(invoice.id);
            purchase.received_at = Some(now);
        }

        purchase.status_history.push(PurchaseStatusChange {
            from: Some(purchase.status),
            to: target,
            changed_by: actor.clone(),
            changed_at: now,
        });
        purchase.status = target;
        purchase.updated_at = now;

        self.purchases.save(&purchase).await?;
        tracing::info!("📦 Compra #{} agora está '{}'", purchase.number, target.as_str());
        Ok(purchase)
    }

    // --- COTAÇÕES ---
    fn ensure_pending(purchase: &PurchaseOrder) -> Result<(), AppError> {
        if purchase.status != PurchaseStatus::Pending {
            return Err(AppError::DocumentLocked(purchase.status.as_str().to_string()));
        }
        Ok(())
    }

    pub async fn add_quotation(
        &self,
        id: Uuid,
        payload: QuotationPayload,
    ) -> Result<PurchaseOrder, AppError> {
        payload.validate()?;
        let mut purchase = self.purchases.require(id).await?;
        Self::ensure_pending(&purchase)?;

        let supplier = self.suppliers.require(payload.supplier_id).await?;
        purchase.quotations.push(Quotation {
            supplier_id: supplier.id,
            supplier_name: supplier.name,
            total_amount: payload.total_amount,
            delivery_days: payload.delivery_days,
            notes: payload.notes,
            selected: false,
        });
        purchase.updated_at = Utc::now();

        self.purchases.save(&purchase).await?;
        Ok(purchase)
    }

    /// Marca a cotação escolhida e troca o fornecedor da compra.
    pub async fn select_quotation(&self, id: Uuid, index: usize) -> Result<PurchaseOrder, AppError> {
        let mut purchase = self.purchases.require(id).await?;
        Self::ensure_pending(&purchase)?;

        if index >= purchase.quotations.len() {
            return Err(AppError::ResourceNotFound("Cotação".to_string()));
        }
        for (i, quotation) in purchase.quotations.iter_mut().enumerate() {
            quotation.selected = i == index;
        }
        let chosen = &purchase.quotations[index];
        purchase.supplier_id = Some(chosen.supplier_id);
        purchase.supplier_name = Some(chosen.supplier_name.clone());
        purchase.updated_at = Utc::now();

        self.purchases.save(&purchase).await?;
        Ok(purchase)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let purchase = self.purchases.require(id).await?;
        if !matches!(purchase.status, PurchaseStatus::Pending | PurchaseStatus::Canceled) {
            return Err(AppError::DocumentLocked(purchase.status.as_str().to_string()));
        }
        self.purchases.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::purchase::PurchaseLinePayload,
        test_support::{actor, memory_state, product_payload, supplier_payload},
    };

    async fn setup(state: &crate::config::AppState) -> (PurchaseOrder, Uuid) {
        let supplier = state.supplier_service.create(supplier_payload("F-1")).await.unwrap();
        let product = state
            .inventory_service
            .create_product(product_payload("P-1", "Parafuso", 5), &actor())
            .await
            .unwrap();
        let purchase = state
            .purchase_service
            .create(
                CreatePurchasePayload {
                    supplier_id: Some(supplier.id),
                    items: vec![PurchaseLinePayload {
                        product_id: product.id,
                        quantity: Decimal::from(20),
                        unit_price: Decimal::from(3),
                    }],
                    expected_delivery: None,
                    notes: None,
                },
                &actor(),
            )
            .await
            .unwrap();
        (purchase, product.id)
    }

    #[tokio::test]
    async fn approval_requires_permission() {
        let state = memory_state();
        let (purchase, _) = setup(&state).await;
        let service = &state.purchase_service;

        assert!(matches!(
            service.update_status(purchase.id, PurchaseStatus::Approved, &actor(), Role::Buyer).await,
            Err(AppError::Forbidden(_))
        ));
        let approved = service
            .update_status(purchase.id, PurchaseStatus::Approved, &actor(), Role::Manager)
            .await
            .unwrap();
        assert_eq!(approved.status, PurchaseStatus::Approved);
    }

    #[tokio::test]
    async fn receiving_posts_invoice_and_stock_once() {
        let state = memory_state();
        let (purchase, product_id) = setup(&state).await;
        let service = &state.purchase_service;

        for status in [PurchaseStatus::Approved, PurchaseStatus::InProgress] {
            service.update_status(purchase.id, status, &actor(), Role::Admin).await.unwrap();
        }

        // Recebimento interrompido depois da nota: repetir não duplica o estoque
        let current = service.get(purchase.id).await.unwrap();
        state.invoice_service.receive_purchase(&current, &actor()).await.unwrap();

        let received = service
            .update_status(purchase.id, PurchaseStatus::Received, &actor(), Role::Admin)
            .await
            .unwrap();
        assert!(received.invoice_id.is_some());
        assert!(received.received_at.is_some());

        let product = state.inventory_service.get_product(product_id).await.unwrap();
        assert_eq!(product.quantity, Decimal::from(25));

        assert!(matches!(
            service.update_status(purchase.id, PurchaseStatus::Canceled, &actor(), Role::Admin).await,
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn quotations_only_while_pending() {
        let state = memory_state();
        let (purchase, _) = setup(&state).await;
        let other = state.supplier_service.create(supplier_payload("F-2")).await.unwrap();
        let service = &state.purchase_service;

        let quote = QuotationPayload {
            supplier_id: other.id,
            total_amount: Decimal::from(55),
            delivery_days: Some(7),
            notes: None,
        };
        service.add_quotation(purchase.id, quote.clone()).await.unwrap();
        let selected = service.select_quotation(purchase.id, 0).await.unwrap();
        assert_eq!(selected.supplier_id, Some(other.id));
        assert!(selected.quotations[0].selected);

        service
            .update_status(purchase.id, PurchaseStatus::Approved, &actor(), Role::Admin)
            .await
            .unwrap();
        assert!(matches!(
            service.add_quotation(purchase.id, quote).await,
            Err(AppError::DocumentLocked(_))
        ));
        assert!(matches!(service.delete(purchase.id).await, Err(AppError::DocumentLocked(_))));
    }
}
