// src/db/memory_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::document_store::{compare_values, Collection, Document, DocumentStore, Query, SortDirection},
};

/// Store em memória (desenvolvimento e testes). Mantém a ordem de inserção.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| query.matches(&d.data)).cloned().collect())
            .unwrap_or_default();

        if let Some((field, direction)) = &query.order_by {
            // sort_by é estável: empates mantêm a ordem de inserção
            docs.sort_by(|a, b| {
                let ord = compare_values(
                    a.data.get(field).unwrap_or(&Value::Null),
                    b.data.get(field).unwrap_or(&Value::Null),
                );
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn insert(&self, collection: Collection, id: Uuid, data: Value) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.id == id) {
            return Err(AppError::DocumentConflict(collection.name().to_string()));
        }
        docs.push(Document { id, data });
        Ok(())
    }

    async fn set(&self, collection: Collection, id: Uuid, data: Value) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        match collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        {
            Some(doc) => {
                doc.data = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_get_set_delete() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();

        store.insert(Collection::Products, id, json!({"name": "A"})).await.unwrap();
        assert!(matches!(
            store.insert(Collection::Products, id, json!({})).await,
            Err(AppError::DocumentConflict(_))
        ));

        assert!(store.set(Collection::Products, id, json!({"name": "B"})).await.unwrap());
        let doc = store.get(Collection::Products, id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "B");

        // coleções são isoladas
        assert!(store.get(Collection::Suppliers, id).await.unwrap().is_none());
        assert!(!store.set(Collection::Suppliers, id, json!({})).await.unwrap());

        assert!(store.delete(Collection::Products, id).await.unwrap());
        assert!(!store.delete(Collection::Products, id).await.unwrap());
    }

    #[tokio::test]
    async fn find_filters_orders_and_limits() {
        let store = MemoryDocumentStore::new();
        for (n, status) in [(3, "a"), (1, "b"), (2, "a"), (5, "a")] {
            store
                .insert(Collection::Orders, Uuid::new_v4(), json!({"n": n, "status": status}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .eq("status", "a")
            .order_by("n", SortDirection::Desc)
            .limit(2);
        let docs = store.find(Collection::Orders, &query).await.unwrap();
        let ns: Vec<_> = docs.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![5, 3]);
    }
}
