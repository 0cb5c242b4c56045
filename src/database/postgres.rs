use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::query_builder::{bind_param_query, QueryBuilder, SqlStatement};
use super::{Record, Storage, StorageError, StorageSession};
use crate::models::EntityKind;
use crate::validation::FieldSet;

/// Postgres-backed storage; each session is one database transaction
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn begin(&self) -> Result<Box<dyn StorageSession>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl PgSession {
    async fn fetch_all(&mut self, entity: EntityKind, stmt: SqlStatement) -> Result<Vec<Record>, StorageError> {
        let mut q = sqlx::query(&stmt.query);
        for p in stmt.params.iter() {
            q = bind_param_query(q, p);
        }

        let rows = q.fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(|row| -> Result<Record, StorageError> {
                let value: Value = row.try_get("row")?;
                Ok(Record::from_row(entity, value)?)
            })
            .collect()
    }

    async fn fetch_optional(
        &mut self,
        entity: EntityKind,
        stmt: SqlStatement,
    ) -> Result<Option<Record>, StorageError> {
        let mut q = sqlx::query(&stmt.query);
        for p in stmt.params.iter() {
            q = bind_param_query(q, p);
        }

        match q.fetch_optional(&mut *self.tx).await? {
            Some(row) => {
                let value: Value = row.try_get("row")?;
                Ok(Some(Record::from_row(entity, value)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StorageSession for PgSession {
    async fn list(&mut self, entity: EntityKind) -> Result<Vec<Record>, StorageError> {
        let stmt = QueryBuilder::new(entity).select_all();
        self.fetch_all(entity, stmt).await
    }

    async fn find(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        let stmt = QueryBuilder::new(entity).select_by_id(id, false);
        self.fetch_optional(entity, stmt).await
    }

    async fn find_for_update(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        let stmt = QueryBuilder::new(entity).select_by_id(id, true);
        self.fetch_optional(entity, stmt).await
    }

    async fn insert(&mut self, entity: EntityKind, fields: &FieldSet) -> Result<Record, StorageError> {
        let stmt = QueryBuilder::new(entity).insert(fields);
        self.fetch_optional(entity, stmt)
            .await?
            .ok_or_else(|| StorageError::Query(format!("insert into {} returned no row", entity)))
    }

    async fn update(&mut self, entity: EntityKind, id: i64, fields: &FieldSet) -> Result<Option<Record>, StorageError> {
        let stmt = QueryBuilder::new(entity).update(id, fields)?;
        self.fetch_optional(entity, stmt).await
    }

    async fn delete(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        let stmt = QueryBuilder::new(entity).delete(id);
        self.fetch_optional(entity, stmt).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let PgSession { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
