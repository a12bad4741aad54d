// src/models/supplier.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        pagination::Searchable,
        validation::{validate_not_blank, validate_tax_id},
    },
    db::{Collection, Entity},
    models::Address,
};

// Cadastro único de fornecedores (substitui as telas "Fornecedor" e "Supplier").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "FOR-010")]
    pub code: String,
    /// Razão social
    #[schema(example = "Metalúrgica Paulista Ltda")]
    pub name: String,
    /// Nome fantasia
    pub trading_name: Option<String>,
    #[schema(example = "11.222.333/0001-81")]
    pub tax_id: String,
    pub state_registration: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Address,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Supplier {
    const COLLECTION: Collection = Collection::Suppliers;
    const LABEL: &'static str = "Fornecedor";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Supplier {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.code),
            Some(&self.name),
            self.trading_name.as_deref(),
            Some(&self.tax_id),
            self.email.as_deref(),
            self.contact_name.as_deref(),
        ]
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub code: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    pub trading_name: Option<String>,

    #[validate(custom(function = "validate_tax_id"))]
    #[schema(example = "11.222.333/0001-81")]
    pub tax_id: String,

    pub state_registration: Option<String>,
    pub contact_name: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub address: Address,

    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetActivePayload {
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierFilter {
    /// Só ativos (true) ou só inativos (false)
    pub active: Option<bool>,
}
