// src/services/order_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Page},
    },
    db::{Query, Repository},
    models::{
        customer::Customer,
        invoice::Invoice,
        order::{CreateOrderPayload, Order, OrderFilter, OrderItem, OrderStatus, OrderStatusChange},
        Actor,
    },
    services::{inventory_service::InventoryService, invoice_service::InvoiceService},
};

pub const WALK_IN_CUSTOMER: &str = "Consumidor final";

#[derive(Clone)]
pub struct OrderService {
    orders: Repository<Order>,
    customers: Repository<Customer>,
    inventory_service: InventoryService,
    invoice_service: InvoiceService,
}

impl OrderService {
    pub fn new(
        orders: Repository<Order>,
        customers: Repository<Customer>,
        inventory_service: InventoryService,
        invoice_service: InvoiceService,
    ) -> Self {
        Self { orders, customers, inventory_service, invoice_service }
    }

    pub async fn list(&self, query: &ListQuery, filter: &OrderFilter) -> Result<Page<Order>, AppError> {
        let db_query = match filter.status {
            Some(status) => Query::new().eq("status", status),
            None => Query::new(),
        };
        let mut orders = self.orders.find(&db_query).await?;
        orders.sort_by(|a, b| b.order_number.cmp(&a.order_number));
        Ok(query.apply(orders))
    }

    pub async fn all(&self) -> Result<Vec<Order>, AppError> {
        self.orders.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.orders.require(id).await
    }

    // --- CRIAÇÃO ---
    pub async fn create(&self, payload: CreateOrderPayload, actor: &Actor) -> Result<Order, AppError> {
        payload.validate()?;
        if payload.items.is_empty() {
            return Err(AppError::EmptyItems);
        }

        let (customer_name, customer_document) = match payload.customer_id {
            Some(id) => {
                let customer = self.customers.require(id).await?;
                (customer.name, customer.document)
            }
            None => (
                payload
                    .customer_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
                None,
            ),
        };

        // Código e nome vêm do cadastro do produto
        let mut items = Vec::with_capacity(payload.items.len());
        for line in &payload.items {
            let product = self.inventory_service.get_product(line.product_id).await?;
            items.push(OrderItem {
                product_id: product.id,
                product_code: product.code,
                product_name: product.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total: line.quantity * line.unit_price,
            });
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: self.orders.next_number("orderNumber").await?,
            customer_id: payload.customer_id,
            customer_name,
            customer_document,
            salesperson_id: actor.id,
            salesperson_name: actor.name.clone(),
            total_amount: Order::items_total(&items),
            items,
            status: OrderStatus::Pending,
            status_history: vec![OrderStatusChange {
                from: None,
                to: OrderStatus::Pending,
                changed_by: actor.clone(),
                changed_at: now,
            }],
            notes: payload.notes,
            invoice_id: None,
            created_at: now,
            updated_at: now,
            shipped_at: None,
        };

        self.orders.create(&order).await?;
        tracing::info!("🛒 Pedido #{} criado ({} itens)", order.order_number, order.items.len());
        Ok(order)
    }

    // --- TRANSIÇÃO ---

    /// Só avança para o próximo status. Uma transição válida grava o pedido
    /// uma única vez; uma inválida não grava nada.
    pub async fn update_status(
        &self,
        id: Uuid,
        target: OrderStatus,
        actor: &Actor,
    ) -> Result<Order, AppError> {
        let mut order = self.orders.require(id).await?;

        if !order.status.can_transition_to(target) {
            return Err(AppError::InvalidStatusTransition {
                from: order.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        let now = Utc::now();
        order.status_history.push(OrderStatusChange {
            from: Some(order.status),
            to: target,
            changed_by: actor.clone(),
            changed_at: now,
        });
        order.status = target;
        order.updated_at = now;
        if target == OrderStatus::Shipped {
            order.shipped_at = Some(now);
        }

        self.orders.save(&order).await?;
        tracing::info!("🚚 Pedido #{} agora está '{}'", order.order_number, target.as_str());
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let order = self.orders.require(id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::DocumentLocked(order.status.as_str().to_string()));
        }
        // Pedido faturado já tem nota e baixa de estoque
        if order.invoice_id.is_some() {
            return Err(AppError::DocumentLocked("invoiced".to_string()));
        }
        self.orders.delete(id).await
    }

    // --- FATURAMENTO ---

    /// Emite a nota de saída do pedido (uma única vez).
    pub async fn issue_invoice(&self, id: Uuid, actor: &Actor) -> Result<Invoice, AppError> {
        let mut order = self.orders.require(id).await?;
        if let Some(invoice_id) = order.invoice_id {
            return self.invoice_service.get(invoice_id).await;
        }

        let invoice = self.invoice_service.issue_for_order(&order, actor).await?;

        order.invoice_id = Some(invoice.id);
        order.updated_at = Utc::now();
        self.orders.save(&order).await?;
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        models::order::OrderItemPayload,
        test_support::{actor, counting_state, memory_state, product_payload},
    };

    fn item(product_id: Uuid, quantity: i64, cents: i64) -> OrderItemPayload {
        OrderItemPayload {
            product_id,
            quantity: Decimal::from(quantity),
            unit_price: Decimal::new(cents, 2),
        }
    }

    fn payload(items: Vec<OrderItemPayload>) -> CreateOrderPayload {
        CreateOrderPayload {
            customer_id: None,
            customer_name: Some("Loja do Zé".into()),
            items,
            notes: None,
        }
    }

    #[tokio::test]
    async fn total_is_the_sum_of_quantity_times_price() {
        let state = memory_state();
        let inventory = &state.inventory_service;
        let a = inventory.create_product(product_payload("A", "Parafuso", 50), &actor()).await.unwrap();
        let b = inventory.create_product(product_payload("B", "Porca", 50), &actor()).await.unwrap();

        let order = state
            .order_service
            .create(payload(vec![item(a.id, 2, 1990), item(b.id, 3, 250)]), &actor())
            .await
            .unwrap();

        assert_eq!(order.total_amount, Decimal::new(4730, 2));
        assert_eq!(order.items[0].product_code, "A");
        assert_eq!(order.items[1].total, Decimal::new(750, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_number, 1);
    }

    #[tokio::test]
    async fn empty_or_unknown_items_are_rejected() {
        let state = memory_state();
        let orders = &state.order_service;

        assert!(matches!(orders.create(payload(vec![]), &actor()).await, Err(AppError::EmptyItems)));
        assert!(matches!(
            orders.create(payload(vec![item(Uuid::new_v4(), 1, 100)]), &actor()).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn legal_transition_writes_once_illegal_writes_nothing() {
        let (state, store) = counting_state();
        let product = state
            .inventory_service
            .create_product(product_payload("A", "Parafuso", 10), &actor())
            .await
            .unwrap();
        let order = state
            .order_service
            .create(payload(vec![item(product.id, 1, 100)]), &actor())
            .await
            .unwrap();

        store.writes.store(0, Ordering::SeqCst);
        let moved = state
            .order_service
            .update_status(order.id, OrderStatus::Separating, &actor())
            .await
            .unwrap();
        assert_eq!(moved.status, OrderStatus::Separating);
        assert_eq!(moved.status_history.len(), 2);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        store.writes.store(0, Ordering::SeqCst);
        let err = state
            .order_service
            .update_status(order.id, OrderStatus::Shipped, &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        store.writes.store(0, Ordering::SeqCst);
        let separated = state
            .order_service
            .update_status(order.id, OrderStatus::Separated, &actor())
            .await
            .unwrap();
        assert_eq!(separated.status, OrderStatus::Separated);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        store.writes.store(0, Ordering::SeqCst);
        let shipped = state
            .order_service
            .update_status(order.id, OrderStatus::Shipped, &actor())
            .await
            .unwrap();
        assert!(shipped.shipped_at.is_some());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn only_pending_orders_can_be_deleted() {
        let state = memory_state();
        let product = state
            .inventory_service
            .create_product(product_payload("A", "Parafuso", 10), &actor())
            .await
            .unwrap();
        let order = state
            .order_service
            .create(payload(vec![item(product.id, 1, 100)]), &actor())
            .await
            .unwrap();
        state.order_service.update_status(order.id, OrderStatus::Separating, &actor()).await.unwrap();

        assert!(matches!(
            state.order_service.delete(order.id).await,
            Err(AppError::DocumentLocked(status)) if status == "separating"
        ));
    }

    #[tokio::test]
    async fn invoiced_order_cannot_be_deleted_and_new_order_still_takes_stock() {
        let state = memory_state();
        let product = state
            .inventory_service
            .create_product(product_payload("A", "Parafuso", 10), &actor())
            .await
            .unwrap();
        let first = state
            .order_service
            .create(payload(vec![item(product.id, 4, 100)]), &actor())
            .await
            .unwrap();
        state.order_service.issue_invoice(first.id, &actor()).await.unwrap();

        assert!(matches!(
            state.order_service.delete(first.id).await,
            Err(AppError::DocumentLocked(status)) if status == "invoiced"
        ));

        // Pedido sem nota pode sair; o número dele volta a ser usado
        let draft = state
            .order_service
            .create(payload(vec![item(product.id, 1, 100)]), &actor())
            .await
            .unwrap();
        state.order_service.delete(draft.id).await.unwrap();
        let second = state
            .order_service
            .create(payload(vec![item(product.id, 2, 100)]), &actor())
            .await
            .unwrap();
        assert_eq!(second.order_number, draft.order_number);

        let invoice = state.order_service.issue_invoice(second.id, &actor()).await.unwrap();
        assert_eq!(invoice.number, 2);
        let product = state.inventory_service.get_product(product.id).await.unwrap();
        assert_eq!(product.quantity, Decimal::from(4));
    }

    #[tokio::test]
    async fn invoicing_decreases_stock_once() {
        let state = memory_state();
        let product = state
            .inventory_service
            .create_product(product_payload("A", "Parafuso", 10), &actor())
            .await
            .unwrap();
        let order = state
            .order_service
            .create(payload(vec![item(product.id, 4, 100)]), &actor())
            .await
            .unwrap();

        let first = state.order_service.issue_invoice(order.id, &actor()).await.unwrap();
        let second = state.order_service.issue_invoice(order.id, &actor()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.items[0].cfop, "5102");
        let product = state.inventory_service.get_product(product.id).await.unwrap();
        assert_eq!(product.quantity, Decimal::from(6));
    }

    #[tokio::test]
    async fn invoicing_without_stock_changes_nothing() {
        let state = memory_state();
        let a = state
            .inventory_service
            .create_product(product_payload("A", "Parafuso", 10), &actor())
            .await
            .unwrap();
        let b = state
            .inventory_service
            .create_product(product_payload("B", "Porca", 1), &actor())
            .await
            .unwrap();
        let order = state
            .order_service
            .create(payload(vec![item(a.id, 4, 100), item(b.id, 2, 100)]), &actor())
            .await
            .unwrap();

        let err = state.order_service.issue_invoice(order.id, &actor()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(
            state.inventory_service.get_product(a.id).await.unwrap().quantity,
            Decimal::from(10)
        );
    }
}
