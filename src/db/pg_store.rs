// src/db/pg_store.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::document_store::{Collection, Document, DocumentStore, Query, SortDirection},
};

// Backend Postgres: cada documento é uma linha JSONB da tabela `documents`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document { id: row.id, data: row.data }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.name());

        // Chave e valor vão como parâmetros: `data -> $k = $v::jsonb`
        for (field, value) in &query.filters {
            if value.is_null() {
                qb.push(" AND COALESCE(data -> ");
                qb.push_bind(field.clone());
                qb.push(", 'null'::jsonb) = 'null'::jsonb");
            } else {
                qb.push(" AND data -> ");
                qb.push_bind(field.clone());
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
        }

        match &query.order_by {
            Some((field, direction)) => {
                qb.push(" ORDER BY data -> ");
                qb.push_bind(field.clone());
                qb.push(match direction {
                    SortDirection::Asc => " ASC NULLS FIRST",
                    SortDirection::Desc => " DESC NULLS LAST",
                });
                qb.push(", created_at ASC");
            }
            None => {
                qb.push(" ORDER BY created_at ASC");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
            .bind(collection.name())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Document::from))
    }

    async fn insert(&self, collection: Collection, id: Uuid, data: Value) -> Result<(), AppError> {
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.name())
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::DocumentConflict(collection.name().to_string());
                    }
                }
                e.into()
            })?;

        Ok(())
    }

    async fn set(&self, collection: Collection, id: Uuid, data: Value) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
            .bind(collection.name())
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
