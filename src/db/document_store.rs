// src/db/document_store.rs

use std::{cmp::Ordering, fmt, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Coleções (uma por entidade, com os nomes usados pelo front-end)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Suppliers,
    Customers,
    Employees,
    Leads,
    Opportunities,
    Campaigns,
    Orders,
    PurchaseOrders,
    Invoices,
    Kardex,
    Goals,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "Estoque",
            Collection::Suppliers => "Suppliers",
            Collection::Customers => "Customers",
            Collection::Employees => "Employees",
            Collection::Leads => "Leads",
            Collection::Opportunities => "Opportunities",
            Collection::Campaigns => "Campaigns",
            Collection::Orders => "Orders",
            Collection::PurchaseOrders => "PurchaseOrders",
            Collection::Invoices => "Invoices",
            Collection::Kardex => "Kardex",
            Collection::Goals => "Goal",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

// ---
// Consulta: só igualdade em campos de primeiro nível + um order-by.
// ---
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Serialize>(mut self, field: &str, value: V) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.filters.push((field.to_string(), value));
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Avalia os filtros contra um documento (usado pelo store em memória).
    pub fn matches(&self, data: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| data.get(field).unwrap_or(&Value::Null) == expected)
    }
}

/// Ordem total entre valores JSON: null < bool < número < string < resto.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// O cliente genérico de coleções de documentos.
/// Escritas são sobrescritas completas; não há transação entre documentos.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, AppError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Falha com `DocumentConflict` se o id já existir.
    async fn insert(&self, collection: Collection, id: Uuid, data: Value) -> Result<(), AppError>;

    /// Sobrescreve o documento inteiro. Retorna `false` se ele não existia.
    async fn set(&self, collection: Collection, id: Uuid, data: Value) -> Result<bool, AppError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, AppError>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_matches_on_equality_only() {
        let query = Query::new().eq("status", "pending").eq("supplierId", Uuid::nil());
        assert!(query.matches(&json!({"status": "pending", "supplierId": Uuid::nil()})));
        assert!(!query.matches(&json!({"status": "shipped", "supplierId": Uuid::nil()})));
        assert!(!query.matches(&json!({"status": "pending"})));
    }

    #[test]
    fn null_filter_matches_missing_field() {
        let query = Query::new().eq("deletedAt", Value::Null);
        assert!(query.matches(&json!({"name": "x"})));
    }

    #[test]
    fn values_compare_numerically_and_lexically() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&Value::Null, &json!(0)), Ordering::Less);
    }
}
