// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        pagination::Searchable,
        validation::{validate_not_blank, validate_not_negative},
    },
    db::{Collection, Entity},
};

pub const DEFAULT_UNIT: &str = "UN";

// --- Produto (coleção "Estoque") ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "PRD-001")]
    pub code: String,
    #[schema(example = "Parafuso Sextavado 1/4")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "2.50")]
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    // Só muda via movimentação (Kardex)
    #[schema(example = "120")]
    pub quantity: Decimal,
    #[schema(example = "UN")]
    pub unit: String,
    #[schema(example = "73181500")]
    pub ncm: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[schema(example = "20")]
    pub minimum_stock: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self, threshold: Decimal) -> bool {
        self.quantity <= threshold
    }

    pub fn is_below_minimum(&self) -> bool {
        self.quantity < self.minimum_stock
    }

    pub fn stock_value(&self) -> Decimal {
        self.quantity * self.price
    }
}

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;
    const LABEL: &'static str = "Produto";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.code),
            Some(&self.name),
            self.description.as_deref(),
            self.ncm.as_deref(),
        ]
    }
}

// ---
// Payload do formulário de cadastro/edição
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "PRD-001")]
    pub code: String,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Parafuso Sextavado 1/4")]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "2.50")]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Option<Decimal>,

    // Estoque inicial; ignorado na edição
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub quantity: Decimal,

    pub unit: Option<String>,

    #[validate(length(equal = 8, message = "invalid_ncm"))]
    pub ncm: Option<String>,

    pub supplier_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub minimum_stock: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    #[serde(flatten)]
    pub product: Product,
    pub threshold: Decimal,
    pub below_minimum: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Sobrescreve o limite configurado (padrão 10)
    pub threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    /// Positivo soma, negativo subtrai
    #[schema(example = "-3")]
    pub delta: Decimal,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Inventário físico")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, minimum: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            code: "P1".into(),
            name: "Porca".into(),
            description: None,
            price: Decimal::new(150, 2),
            cost_price: None,
            quantity: Decimal::from(quantity),
            unit: DEFAULT_UNIT.into(),
            ncm: None,
            supplier_id: None,
            minimum_stock: Decimal::from(minimum),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_inclusive_at_threshold() {
        let ten = Decimal::from(10);
        assert!(product(10, 0).is_low_stock(ten));
        assert!(product(0, 0).is_low_stock(ten));
        assert!(!product(11, 0).is_low_stock(ten));
        assert!(product(5, 0).is_low_stock(Decimal::from(5)));
        assert!(!product(6, 0).is_low_stock(Decimal::from(5)));
    }

    #[test]
    fn below_minimum_and_value() {
        assert!(product(4, 5).is_below_minimum());
        assert!(!product(5, 5).is_below_minimum());
        assert_eq!(product(4, 0).stock_value(), Decimal::new(600, 2));
    }

    #[test]
    fn empty_name_is_rejected() {
        let payload: ProductPayload = serde_json::from_value(serde_json::json!({
            "code": "P1", "name": "", "price": 1.0
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }
}
