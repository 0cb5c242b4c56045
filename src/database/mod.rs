//! Storage collaborator used by the entity pipeline.
//!
//! A [`Storage`] hands out one [`StorageSession`] per request. A session is a
//! transaction: everything done through it becomes visible on
//! [`StorageSession::commit`], and dropping it without committing discards
//! the work.

pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query_builder;
pub mod record;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::EntityKind;
use crate::validation::FieldSet;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStorage;
pub use postgres::PgStorage;
pub use record::{Record, RecordError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Unique, foreign key or not-null constraint rejected the write
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a session; the caller owns it until commit or drop
    async fn begin(&self) -> Result<Box<dyn StorageSession>, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;

    fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait StorageSession: Send {
    async fn list(&mut self, entity: EntityKind) -> Result<Vec<Record>, StorageError>;

    async fn find(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError>;

    /// Like `find`, but the row stays locked until the session ends
    async fn find_for_update(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError>;

    async fn insert(&mut self, entity: EntityKind, fields: &FieldSet) -> Result<Record, StorageError>;

    /// Returns `None` when no row has this id
    async fn update(&mut self, entity: EntityKind, id: i64, fields: &FieldSet) -> Result<Option<Record>, StorageError>;

    /// Returns the removed row, or `None` when no row has this id
    async fn delete(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

impl From<RecordError> for StorageError {
    fn from(err: RecordError) -> Self {
        StorageError::Query(err.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation, foreign_key_violation, not_null_violation, check_violation
                Some("23505") | Some("23503") | Some("23502") | Some("23514") => {
                    StorageError::Constraint(db.message().to_string())
                }
                _ => StorageError::Query(err.to_string()),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StorageError::Unavailable(err.to_string()),
            _ => StorageError::Query(err.to_string()),
        }
    }
}
