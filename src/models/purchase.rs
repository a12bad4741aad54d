// src/models/purchase.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        pagination::Searchable,
        validation::{validate_not_negative, validate_positive},
    },
    db::{Collection, Entity},
    models::Actor,
};

// ---
// Requisição de compra: pending -> approved -> in_progress -> received
// (canceled a partir de qualquer estado não terminal)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Approved,
    InProgress,
    Received,
    Canceled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Approved => "approved",
            PurchaseStatus::InProgress => "in_progress",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseStatus::Received | PurchaseStatus::Canceled)
    }

    pub fn can_transition_to(&self, target: PurchaseStatus) -> bool {
        use PurchaseStatus::*;
        match (self, target) {
            (current, Canceled) => !current.is_terminal(),
            (Pending, Approved) | (Approved, InProgress) | (InProgress, Received) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub total_amount: Decimal,
    pub delivery_days: Option<u32>,
    pub notes: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStatusChange {
    pub from: Option<PurchaseStatus>,
    pub to: PurchaseStatus,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(example = 57)]
    pub number: i64,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub items: Vec<PurchaseLine>,
    pub total_amount: Decimal,
    pub quotations: Vec<Quotation>,
    pub status: PurchaseStatus,
    pub status_history: Vec<PurchaseStatusChange>,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
    pub invoice_id: Option<Uuid>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn document_ref(&self) -> String {
        format!("PC-{}-{}", self.number, self.id.simple())
    }
}

impl Entity for PurchaseOrder {
    const COLLECTION: Collection = Collection::PurchaseOrders;
    const LABEL: &'static str = "Pedido de compra";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for PurchaseOrder {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.supplier_name.as_deref(),
            Some(&self.requester_name),
            self.notes.as_deref(),
        ]
    }
}

// ---
// Payloads
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLinePayload {
    pub product_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    pub supplier_id: Option<Uuid>,
    #[validate(nested)]
    pub items: Vec<PurchaseLinePayload>,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePurchaseStatusPayload {
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPayload {
    pub supplier_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    pub total_amount: Decimal,
    pub delivery_days: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseFilter {
    pub status: Option<PurchaseStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseStatus::*;

    #[test]
    fn happy_path_and_cancellation() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Received));
        assert!(Approved.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Received));
    }

    #[test]
    fn terminal_states_are_final() {
        for target in [Pending, Approved, InProgress, Received, Canceled] {
            assert!(!Received.can_transition_to(target));
            assert!(!Canceled.can_transition_to(target));
        }
    }

    #[test]
    fn line_price_must_be_positive() {
        let payload: CreatePurchasePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::new_v4(), "quantity": 1, "unitPrice": -2 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
