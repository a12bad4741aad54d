// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersByStatus {
    pub pending: usize,
    pub separating: usize,
    pub separated: usize,
    pub shipped: usize,
}

// Indicadores da tela inicial
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: usize,
    pub low_stock_count: usize,
    pub low_stock_threshold: Decimal,
    pub stock_value: Decimal,
    pub orders_by_status: OrdersByStatus,
    pub shipped_sales_total: Decimal,
    pub pending_purchase_orders: usize,
    pub open_leads: usize,
    pub open_pipeline_value: Decimal,
}
