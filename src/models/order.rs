// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{pagination::Searchable, validation::validate_positive},
    db::{Collection, Entity},
    models::Actor,
};

// ---
// Fluxo do pedido: pendente -> separando -> separado -> enviado
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "separando")]
    Separating,
    #[serde(alias = "separado")]
    Separated,
    #[serde(alias = "enviado")]
    Shipped,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Separating => "separating",
            OrderStatus::Separated => "separated",
            OrderStatus::Shipped => "shipped",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Separating),
            OrderStatus::Separating => Some(OrderStatus::Separated),
            OrderStatus::Separated => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => None,
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChange {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = 1042)]
    pub order_number: i64,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_document: Option<String>,
    pub salesperson_id: Uuid,
    pub salesperson_name: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub status_history: Vec<OrderStatusChange>,
    pub notes: Option<String>,
    pub invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn items_total(items: &[OrderItem]) -> Decimal {
        items.iter().map(|item| item.total).sum()
    }

    /// Referência das movimentações de estoque. O número pode voltar a ser
    /// usado depois de uma exclusão; o id não.
    pub fn document_ref(&self) -> String {
        format!("PED-{}-{}", self.order_number, self.id.simple())
    }
}

impl Entity for Order {
    const COLLECTION: Collection = Collection::Orders;
    const LABEL: &'static str = "Pedido";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Order {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.customer_name),
            self.customer_document.as_deref(),
            Some(&self.salesperson_name),
            self.notes.as_deref(),
        ]
    }
}

// ---
// Payloads
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "2")]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "19.90")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    /// Cliente cadastrado; nome e documento são copiados dele
    pub customer_id: Option<Uuid>,
    /// Usado quando não há cliente cadastrado
    pub customer_name: Option<String>,

    #[validate(nested)]
    pub items: Vec<OrderItemPayload>,

    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatusPayload {
    /// Aceita também os nomes em português (pendente, separando, separado, enviado)
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portuguese_status_names_are_accepted() {
        let parsed: UpdateOrderStatusPayload =
            serde_json::from_value(serde_json::json!({ "status": "enviado" })).unwrap();
        assert_eq!(parsed.status, OrderStatus::Shipped);

        let parsed: UpdateOrderStatusPayload =
            serde_json::from_value(serde_json::json!({ "status": "separating" })).unwrap();
        assert_eq!(parsed.status, OrderStatus::Separating);

        assert_eq!(serde_json::to_value(OrderStatus::Separated).unwrap(), "separated");
    }

    #[test]
    fn only_the_next_status_is_reachable() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Separating));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Separated.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Shipped.next().is_none());
    }

    #[test]
    fn zero_quantity_item_is_rejected() {
        let payload: CreateOrderPayload = serde_json::from_value(serde_json::json!({
            "customerName": "Balcão",
            "items": [{ "productId": Uuid::new_v4(), "quantity": 0, "unitPrice": 10 }]
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }
}
