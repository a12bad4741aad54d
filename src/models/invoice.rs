// src/models/invoice.rs

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
};

pub const DEFAULT_SERIES: i64 = 1;
pub const CFOP_ENTRY: &str = "1102";
pub const CFOP_EXIT: &str = "5102";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceKind {
    Entry,
    Exit,
}

impl InvoiceKind {
    pub fn cfop(&self) -> &'static str {
        match self {
            InvoiceKind::Entry => CFOP_ENTRY,
            InvoiceKind::Exit => CFOP_EXIT,
        }
    }

    /// tpNF do DANFE: 0 = entrada, 1 = saída
    pub fn code(&self) -> u8 {
        match self {
            InvoiceKind::Entry => 0,
            InvoiceKind::Exit => 1,
        }
    }
}

/// Emitente ou destinatário da nota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiscalParty {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub product_code: String,
    pub description: String,
    pub ncm: Option<String>,
    #[schema(example = "5102")]
    pub cfop: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub kind: InvoiceKind,
    pub number: i64,
    pub series: i64,
    #[schema(example = "35241011222333000181550010000001231000001237")]
    pub access_key: String,
    pub issuer: FiscalParty,
    pub recipient: FiscalParty,
    pub issue_date: NaiveDate,
    pub operation_date: Option<NaiveDate>,
    pub items: Vec<InvoiceLine>,
    pub total_products: Decimal,
    pub freight: Decimal,
    pub total_amount: Decimal,
    pub purchase_order_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Referência gravada no Kardex ("NF-E-123" / "NF-S-45").
    pub fn document_ref(&self) -> String {
        let prefix = match self.kind {
            InvoiceKind::Entry => "NF-E",
            InvoiceKind::Exit => "NF-S",
        };
        format!("{}-{}-{}", prefix, self.number, self.id.simple())
    }
}

impl Entity for Invoice {
    const COLLECTION: Collection = Collection::Invoices;
    const LABEL: &'static str = "Nota fiscal";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Invoice {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.access_key),
            Some(&self.issuer.name),
            Some(&self.recipient.name),
            self.issuer.tax_id.as_deref(),
            self.recipient.tax_id.as_deref(),
        ]
    }
}

// ---
// Formulário de entrada de nota (compra avulsa)
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryLinePayload {
    pub product_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryInvoicePayload {
    pub supplier_id: Uuid,
    /// Número da nota do fornecedor
    #[schema(example = 123)]
    pub number: i64,
    pub series: Option<i64>,
    /// Gerada quando ausente
    pub access_key: Option<String>,
    pub issue_date: NaiveDate,
    pub operation_date: Option<NaiveDate>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub freight: Decimal,
    #[validate(nested)]
    pub items: Vec<EntryLinePayload>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub kind: Option<InvoiceKind>,
}
