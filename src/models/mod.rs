pub mod crm;
pub mod customer;
pub mod dashboard;
pub mod employee;
pub mod goal;
pub mod invoice;
pub mod kardex;
pub mod order;
pub mod product;
pub mod purchase;
pub mod supplier;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Endereço livre, como no formulário de cadastro.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[schema(example = "Rua das Flores")]
    pub street: Option<String>,
    #[schema(example = "123")]
    pub number: Option<String>,
    pub complement: Option<String>,
    #[schema(example = "Centro")]
    pub district: Option<String>,
    #[schema(example = "São Paulo")]
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "invalid_state"))]
    #[schema(example = "SP")]
    pub state: Option<String>,
    #[schema(example = "01001-000")]
    pub zip_code: Option<String>,
}

impl Address {
    /// "Rua das Flores, 123 - Centro - São Paulo/SP"
    pub fn one_line(&self) -> String {
        let street = [self.street.as_deref(), self.number.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let city = match (self.city.as_deref(), self.state.as_deref()) {
            (Some(c), Some(s)) => Some(format!("{}/{}", c, s)),
            (Some(c), None) => Some(c.to_string()),
            (None, Some(s)) => Some(s.to_string()),
            (None, None) => None,
        };
        [Some(street).filter(|s| !s.is_empty()), self.district.clone(), city]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// Quem executou a operação (vai para o Kardex e para os históricos).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}
