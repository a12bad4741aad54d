// src/db/repository.rs

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::document_store::{Collection, Document, Query, SharedStore, SortDirection},
};

/// Um registro persistido numa coleção do document store.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;
    /// Nome exibido nas mensagens de "não encontrado".
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
}

// Repositório tipado sobre o store genérico.
pub struct Repository<T> {
    store: SharedStore,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), _entity: PhantomData }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: SharedStore) -> Self {
        Self { store, _entity: PhantomData }
    }

    fn decode(doc: Document) -> Result<T, AppError> {
        serde_json::from_value(doc.data).map_err(|e| {
            tracing::error!("🔥 Documento {} inválido em {}: {}", doc.id, T::COLLECTION, e);
            AppError::SerializationError(e)
        })
    }

    pub async fn list(&self) -> Result<Vec<T>, AppError> {
        self.find(&Query::new()).await
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<T>, AppError> {
        self.store
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn find_one(&self, query: Query) -> Result<Option<T>, AppError> {
        let mut found = self.find(&query.limit(1)).await?;
        Ok(found.pop())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, AppError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Como `get`, mas ausência vira `ResourceNotFound`.
    pub async fn require(&self, id: Uuid) -> Result<T, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(T::LABEL.to_string()))
    }

    pub async fn create(&self, entity: &T) -> Result<(), AppError> {
        let data = serde_json::to_value(entity)?;
        self.store.insert(T::COLLECTION, entity.id(), data).await
    }

    /// Sobrescrita completa do documento (last-write-wins).
    pub async fn save(&self, entity: &T) -> Result<(), AppError> {
        let data = serde_json::to_value(entity)?;
        if !self.store.set(T::COLLECTION, entity.id(), data).await? {
            return Err(AppError::ResourceNotFound(T::LABEL.to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(T::COLLECTION, id).await? {
            return Err(AppError::ResourceNotFound(T::LABEL.to_string()));
        }
        Ok(())
    }

    /// Próximo número sequencial (maior valor do campo + 1).
    pub async fn next_number(&self, field: &str) -> Result<i64, AppError> {
        let query = Query::new().order_by(field, SortDirection::Desc).limit(1);
        let last = self
            .store
            .find(T::COLLECTION, &query)
            .await?
            .first()
            .and_then(|doc| doc.data.get(field).and_then(|v| v.as_i64()))
            .unwrap_or(0);
        Ok(last + 1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;
    use crate::db::MemoryDocumentStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        number: i64,
        text: String,
    }

    impl Entity for Note {
        const COLLECTION: Collection = Collection::Goals;
        const LABEL: &'static str = "Nota";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn repo() -> Repository<Note> {
        Repository::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn round_trips_typed_entities() {
        let repo = repo();
        let note = Note { id: Uuid::new_v4(), number: 1, text: "a".into() };
        repo.create(&note).await.unwrap();

        assert_eq!(repo.require(note.id).await.unwrap(), note);
        assert!(matches!(
            repo.require(Uuid::new_v4()).await,
            Err(AppError::ResourceNotFound(label)) if label == "Nota"
        ));
    }

    #[tokio::test]
    async fn save_requires_existing_document() {
        let repo = repo();
        let note = Note { id: Uuid::new_v4(), number: 1, text: "a".into() };
        assert!(matches!(repo.save(&note).await, Err(AppError::ResourceNotFound(_))));
        assert!(matches!(repo.delete(note.id).await, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn next_number_follows_the_highest() {
        let repo = repo();
        assert_eq!(repo.next_number("number").await.unwrap(), 1);
        for number in [4, 9, 2] {
            let note = Note { id: Uuid::new_v4(), number, text: String::new() };
            repo.create(&note).await.unwrap();
        }
        assert_eq!(repo.next_number("number").await.unwrap(), 10);
    }
}
