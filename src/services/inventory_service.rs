// src/services/inventory_service.rs

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
        kardex::{KardexEntry, KardexQuery, MovementKind},
        product::{AdjustStockPayload, LowStockEntry, Product, ProductPayload, DEFAULT_UNIT},
        supplier::Supplier,
        Actor,
    },
};

/// Uma movimentação de estoque a ser aplicada (e registrada no Kardex).
#[derive(Debug, Clone)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub kind: MovementKind,
    /// Variação com sinal
    pub delta: Decimal,
    pub unit_cost: Option<Decimal>,
    pub document_ref: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct InventoryService {
    products: Repository<Product>,
    kardex: Repository<KardexEntry>,
    suppliers: Repository<Supplier>,
    low_stock_threshold: Decimal,
}

impl InventoryService {
    pub fn new(
        products: Repository<Product>,
        kardex: Repository<KardexEntry>,
        suppliers: Repository<Supplier>,
        low_stock_threshold: Decimal,
    ) -> Self {
        Self { products, kardex, suppliers, low_stock_threshold }
    }

    pub fn low_stock_threshold(&self) -> Decimal {
        self.low_stock_threshold
    }

    // --- PRODUTOS ---
    pub async fn list_products(&self, query: &ListQuery) -> Result<Page<Product>, AppError> {
        let mut products = self.products.list().await?;
        products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(query.apply(products))
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, AppError> {
        self.products.list().await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.products.require(id).await
    }

    async fn ensure_unique_code(&self, code: &str, except: Option<Uuid>) -> Result<(), AppError> {
        let existing = self.products.find_one(Query::new().eq("code", code)).await?;
        match existing {
            Some(p) if Some(p.id) != except => Err(AppError::CodeAlreadyExists(code.to_string())),
            _ => Ok(()),
        }
    }

    async fn ensure_supplier(&self, supplier_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = supplier_id {
            self.suppliers.require(id).await?;
        }
        Ok(())
    }

    pub async fn create_product(
        &self,
        payload: ProductPayload,
        actor: &Actor,
    ) -> Result<Product, AppError> {
        payload.validate()?;

        let code = payload.code.trim().to_string();
        self.ensure_unique_code(&code, None).await?;
        self.ensure_supplier(payload.supplier_id).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            code,
            name: payload.name.trim().to_string(),
            description: payload.description,
            price: payload.price,
            cost_price: payload.cost_price,
            quantity: Decimal::ZERO,
            unit: payload.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            ncm: payload.ncm,
            supplier_id: payload.supplier_id,
            minimum_stock: payload.minimum_stock,
            created_at: now,
            updated_at: now,
        };
        self.products.create(&product).await?;
        tracing::info!("📦 Produto {} criado por {}", product.code, actor.name);

        // O saldo inicial entra pelo Kardex, como qualquer outra movimentação
        if payload.quantity > Decimal::ZERO {
            self.apply_movement(
                StockMovement {
                    product_id: product.id,
                    kind: MovementKind::Entry,
                    delta: payload.quantity,
                    unit_cost: product.cost_price,
                    document_ref: None,
                    notes: Some("Estoque inicial".to_string()),
                },
                Some(actor),
            )
            .await?;
            return self.products.require(product.id).await;
        }

        Ok(product)
    }

    /// Sobrescreve os campos editáveis; a quantidade só muda por movimentação.
    pub async fn update_product(&self, id: Uuid, payload: ProductPayload) -> Result<Product, AppError> {
        payload.validate()?;

        let mut product = self.products.require(id).await?;
        let code = payload.code.trim().to_string();
        self.ensure_unique_code(&code, Some(id)).await?;
        self.ensure_supplier(payload.supplier_id).await?;

        product.code = code;
        product.name = payload.name.trim().to_string();
        product.description = payload.description;
        product.price = payload.price;
        product.cost_price = payload.cost_price;
        product.unit = payload.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string());
        product.ncm = payload.ncm;
        product.supplier_id = payload.supplier_id;
        product.minimum_stock = payload.minimum_stock;
        product.updated_at = Utc::now();

        self.products.save(&product).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        self.products.delete(id).await
    }

    /// Produtos com `quantity <= threshold`, do menor saldo para o maior.
    pub async fn low_stock(&self, threshold: Option<Decimal>) -> Result<Vec<LowStockEntry>, AppError> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);

        let mut low: Vec<Product> = self
            .products
            .list()
            .await?
            .into_iter()
            .filter(|p| p.is_low_stock(threshold))
            .collect();
        low.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));

        Ok(low
            .into_iter()
            .map(|product| LowStockEntry {
                below_minimum: product.is_below_minimum(),
                product,
                threshold,
            })
            .collect())
    }

    // --- MOVIMENTAÇÕES ---
    pub async fn adjust_stock(
        &self,
        id: Uuid,
        payload: AdjustStockPayload,
        actor: &Actor,
    ) -> Result<KardexEntry, AppError> {
        payload.validate()?;

        self.apply_movement(
            StockMovement {
                product_id: id,
                kind: MovementKind::Adjustment,
                delta: payload.delta,
                unit_cost: None,
                document_ref: None,
                notes: Some(payload.reason),
            },
            Some(actor),
        )
        .await
    }

    /// Aplica a movimentação no saldo do produto e grava o Kardex.
    ///
    /// Com `document_ref`, a operação é idempotente: se o Kardex já tem uma
    /// entrada com a mesma referência para o produto, ela é devolvida e o
    /// saldo não é tocado.
    pub async fn apply_movement(
        &self,
        movement: StockMovement,
        actor: Option<&Actor>,
    ) -> Result<KardexEntry, AppError> {
        if let Some(reference) = &movement.document_ref {
            let recorded = self
                .kardex
                .find_one(
                    Query::new()
                        .eq("documentRef", reference)
                        .eq("productId", movement.product_id),
                )
                .await?;
            if let Some(entry) = recorded {
                tracing::debug!("Movimentação {} já registrada, ignorando", reference);
                return Ok(entry);
            }
        }

        let mut product = self.products.require(movement.product_id).await?;
        let balance = product.quantity + movement.delta;
        if balance < Decimal::ZERO {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
                available: product.quantity,
                requested: -movement.delta,
            });
        }

        let now = Utc::now();
        product.quantity = balance;
        product.updated_at = now;
        self.products.save(&product).await?;

        let entry = KardexEntry {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            kind: movement.kind,
            quantity: movement.delta,
            balance_after: balance,
            unit_cost: movement.unit_cost,
            document_ref: movement.document_ref,
            user_id: actor.map(|a| a.id),
            user_name: actor.map(|a| a.name.clone()),
            notes: movement.notes,
            created_at: now,
        };
        self.kardex.create(&entry).await?;

        Ok(entry)
    }

    /// Histórico de movimentações, mais recentes primeiro.
    pub async fn kardex(&self, query: &KardexQuery) -> Result<Vec<KardexEntry>, AppError> {
        let filter = match query.product_id {
            Some(id) => Query::new().eq("productId", id),
            None => Query::new(),
        };
        let mut entries = self.kardex.find(&filter).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{actor, memory_state, product_payload};

    #[tokio::test]
    async fn initial_quantity_is_recorded_in_kardex() {
        let state = memory_state();
        let inventory = &state.inventory_service;

        let product = inventory
            .create_product(product_payload("P-1", "Parafuso", 25), &actor())
            .await
            .unwrap();
        assert_eq!(product.quantity, Decimal::from(25));

        let history = inventory.kardex(&KardexQuery { product_id: Some(product.id) }).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, MovementKind::Entry);
        assert_eq!(history[0].balance_after, Decimal::from(25));
    }

    #[tokio::test]
    async fn empty_name_and_duplicate_code_are_rejected() {
        let state = memory_state();
        let inventory = &state.inventory_service;

        let err = inventory
            .create_product(product_payload("P-1", "", 0), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        inventory.create_product(product_payload("P-1", "Porca", 0), &actor()).await.unwrap();
        let err = inventory
            .create_product(product_payload("P-1", "Arruela", 0), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CodeAlreadyExists(code) if code == "P-1"));
    }

    #[tokio::test]
    async fn low_stock_uses_inclusive_threshold_and_override() {
        let state = memory_state();
        let inventory = &state.inventory_service;
        for (code, qty) in [("A", 3), ("B", 10), ("C", 11), ("D", 5)] {
            inventory.create_product(product_payload(code, code, qty), &actor()).await.unwrap();
        }

        let default: Vec<_> = inventory
            .low_stock(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.product.code)
            .collect();
        assert_eq!(default, vec!["A", "D", "B"]);

        let strict: Vec<_> = inventory
            .low_stock(Some(Decimal::from(5)))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.product.code)
            .collect();
        assert_eq!(strict, vec!["A", "D"]);
    }

    #[tokio::test]
    async fn update_keeps_quantity() {
        let state = memory_state();
        let inventory = &state.inventory_service;
        let product = inventory
            .create_product(product_payload("P-1", "Porca", 7), &actor())
            .await
            .unwrap();

        let mut payload = product_payload("P-1", "Porca M8", 999);
        payload.price = Decimal::from(3);
        let updated = inventory.update_product(product.id, payload).await.unwrap();

        assert_eq!(updated.name, "Porca M8");
        assert_eq!(updated.quantity, Decimal::from(7));
    }

    #[tokio::test]
    async fn adjustment_cannot_go_negative() {
        let state = memory_state();
        let inventory = &state.inventory_service;
        let product = inventory
            .create_product(product_payload("P-1", "Porca", 2), &actor())
            .await
            .unwrap();

        let payload = AdjustStockPayload { delta: Decimal::from(-3), reason: "Perda".into() };
        let err = inventory.adjust_stock(product.id, payload, &actor()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        let payload = AdjustStockPayload { delta: Decimal::from(-2), reason: "Perda".into() };
        let entry = inventory.adjust_stock(product.id, payload, &actor()).await.unwrap();
        assert_eq!(entry.balance_after, Decimal::ZERO);
        assert_eq!(entry.kind, MovementKind::Adjustment);
    }

    #[tokio::test]
    async fn movements_with_reference_are_applied_once() {
        let state = memory_state();
        let inventory = &state.inventory_service;
        let product = inventory
            .create_product(product_payload("P-1", "Porca", 0), &actor())
            .await
            .unwrap();

        let movement = StockMovement {
            product_id: product.id,
            kind: MovementKind::Entry,
            delta: Decimal::from(4),
            unit_cost: None,
            document_ref: Some("NF-E-1#0".into()),
            notes: None,
        };
        let first = inventory.apply_movement(movement.clone(), None).await.unwrap();
        let second = inventory.apply_movement(movement, None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(inventory.get_product(product.id).await.unwrap().quantity, Decimal::from(4));
    }
}
