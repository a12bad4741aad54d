// src/services/dashboard_service.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardSummary, OrdersByStatus},
        order::OrderStatus,
        purchase::PurchaseStatus,
    },
    services::{
        crm_service::CrmService, inventory_service::InventoryService, order_service::OrderService,
        purchase_service::PurchaseService,
    },
};

#[derive(Clone)]
pub struct DashboardService {
    inventory_service: InventoryService,
    order_service: OrderService,
    purchase_service: PurchaseService,
    crm_service: CrmService,
}

impl DashboardService {
    pub fn new(
        inventory_service: InventoryService,
        order_service: OrderService,
        purchase_service: PurchaseService,
        crm_service: CrmService,
    ) -> Self {
        Self { inventory_service, order_service, purchase_service, crm_service }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        let threshold = self.inventory_service.low_stock_threshold();
        let products = self.inventory_service.all_products().await?;
        let orders = self.order_service.all().await?;

        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        let orders_by_status = OrdersByStatus {
            pending: count(OrderStatus::Pending),
            separating: count(OrderStatus::Separating),
            separated: count(OrderStatus::Separated),
            shipped: count(OrderStatus::Shipped),
        };

        let pending_purchase_orders = self
            .purchase_service
            .all()
            .await?
            .iter()
            .filter(|p| p.status == PurchaseStatus::Pending)
            .count();

        let open_leads = self
            .crm_service
            .all_leads()
            .await?
            .iter()
            .filter(|l| l.status.is_open())
            .count();

        let open_pipeline_value = self
            .crm_service
            .all_opportunities()
            .await?
            .iter()
            .filter(|o| !o.stage.is_closed())
            .map(|o| o.estimated_value)
            .sum::<Decimal>();

        Ok(DashboardSummary {
            product_count: products.len(),
            low_stock_count: products.iter().filter(|p| p.is_low_stock(threshold)).count(),
            low_stock_threshold: threshold,
            stock_value: products.iter().map(|p| p.stock_value()).sum(),
            orders_by_status,
            shipped_sales_total: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Shipped)
                .map(|o| o.total_amount)
                .sum(),
            pending_purchase_orders,
            open_leads,
            open_pipeline_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{actor, lead_payload, memory_state, product_payload};

    #[tokio::test]
    async fn summary_counts_stock_and_leads() {
        let state = memory_state();
        for (code, qty) in [("A", 4), ("B", 40)] {
            state
                .inventory_service
                .create_product(product_payload(code, code, qty), &actor())
                .await
                .unwrap();
        }
        state.crm_service.create_lead(lead_payload("Carlos")).await.unwrap();

        let summary = state.dashboard_service.get_summary().await.unwrap();
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.low_stock_count, 1);
        // product_payload usa preço 10
        assert_eq!(summary.stock_value, Decimal::from(440));
        assert_eq!(summary.open_leads, 1);
        assert_eq!(summary.orders_by_status.pending, 0);
    }
}
