// src/models/kardex.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::{Collection, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Entry,
    Exit,
    Adjustment,
}

// --- Kardex (auditoria de movimentações de estoque) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KardexEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub kind: MovementKind,
    /// Variação com sinal (saídas são negativas)
    #[schema(example = "-2")]
    pub quantity: Decimal,
    pub balance_after: Decimal,
    pub unit_cost: Option<Decimal>,
    /// Documento de origem; movimentações com referência são idempotentes
    #[schema(example = "NFE-ENT:1234:0")]
    pub document_ref: Option<String>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for KardexEntry {
    const COLLECTION: Collection = Collection::Kardex;
    const LABEL: &'static str = "Movimentação";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct KardexQuery {
    pub product_id: Option<Uuid>,
}
