// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub name: String,
    /// CPF ou CNPJ
    #[schema(example = "529.982.247-25")]
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Address,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Customer {
    const COLLECTION: Collection = Collection::Customers;
    const LABEL: &'static str = "Cliente";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Customer {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.name),
            self.document.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_tax_id"))]
    pub document: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub address: Address,

    pub notes: Option<String>,
}
