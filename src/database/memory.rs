use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Record, Storage, StorageError, StorageSession};
use crate::models::EntityKind;
use crate::validation::FieldSet;

#[derive(Debug, Clone, Default)]
struct Tables {
    rows: BTreeMap<EntityKind, BTreeMap<i64, Record>>,
    last_id: BTreeMap<EntityKind, i64>,
}

impl Tables {
    fn table(&self, entity: EntityKind) -> impl Iterator<Item = &Record> {
        self.rows.get(&entity).into_iter().flat_map(|rows| rows.values())
    }

    fn get(&self, entity: EntityKind, id: i64) -> Option<&Record> {
        self.rows.get(&entity).and_then(|rows| rows.get(&id))
    }

    fn next_id(&mut self, entity: EntityKind) -> i64 {
        let last = self.last_id.entry(entity).or_insert(0);
        *last += 1;
        *last
    }

    /// Unique columns and references, the same constraints the Postgres schema declares
    fn check_constraints(&self, record: &Record) -> Result<(), StorageError> {
        let entity = record.entity();
        let schema = entity.schema();

        for spec in schema.unique_fields() {
            let value = match record.get(spec.name) {
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let taken = self
                .table(entity)
                .any(|other| other.id() != record.id() && other.get(spec.name) == Some(value));
            if taken {
                return Err(StorageError::Constraint(format!(
                    "duplicate key value violates unique constraint on {}.{}",
                    entity, spec.name
                )));
            }
        }

        for (spec, target) in schema.references() {
            let Some(id) = record.get(spec.name).and_then(Value::as_i64) else {
                continue;
            };
            if self.get(target, id).is_none() {
                return Err(StorageError::Constraint(format!(
                    "{}.{} references missing {} row {}",
                    entity, spec.name, target, id
                )));
            }
        }

        Ok(())
    }

    /// First row in another table still pointing at (`entity`, `id`)
    fn referenced_by(&self, entity: EntityKind, id: i64) -> Option<(EntityKind, &'static str)> {
        EntityKind::ALL.into_iter().find_map(|source| {
            source
                .schema()
                .references()
                .filter(|(_, target)| *target == entity)
                .find(|(spec, _)| {
                    self.table(source)
                        .any(|row| row.get(spec.name).and_then(Value::as_i64) == Some(id))
                })
                .map(|(spec, _)| (source, spec.name))
        })
    }
}

/// In-process storage used when no database is configured and in tests.
///
/// Sessions are serialized: a session holds the store lock until it is
/// committed or dropped, and works on a private copy that replaces the
/// shared tables only on commit.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
    writes: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert, update and delete calls made through any session
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Committed rows in one table
    pub async fn row_count(&self, entity: EntityKind) -> usize {
        self.tables.lock().await.table(entity).count()
    }

    /// Make `begin` and `ping` fail as if the backend went away
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> Result<Box<dyn StorageSession>, StorageError> {
        self.ensure_online()?;
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemorySession {
            guard,
            working,
            writes: self.writes.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.ensure_online()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    writes: Arc<AtomicUsize>,
}

impl MemorySession {
    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageSession for MemorySession {
    async fn list(&mut self, entity: EntityKind) -> Result<Vec<Record>, StorageError> {
        Ok(self.working.table(entity).cloned().collect())
    }

    async fn find(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        Ok(self.working.get(entity, id).cloned())
    }

    async fn find_for_update(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        // the session already holds the store lock
        self.find(entity, id).await
    }

    async fn insert(&mut self, entity: EntityKind, fields: &FieldSet) -> Result<Record, StorageError> {
        self.count_write();
        let id = self.working.next_id(entity);
        let record = Record::from_fields(entity, id, fields);
        self.working.check_constraints(&record)?;

        self.working
            .rows
            .entry(entity)
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(&mut self, entity: EntityKind, id: i64, fields: &FieldSet) -> Result<Option<Record>, StorageError> {
        self.count_write();
        let Some(mut record) = self.working.get(entity, id).cloned() else {
            return Ok(None);
        };
        record.apply(fields);
        self.working.check_constraints(&record)?;

        self.working
            .rows
            .entry(entity)
            .or_default()
            .insert(id, record.clone());
        Ok(Some(record))
    }

    async fn delete(&mut self, entity: EntityKind, id: i64) -> Result<Option<Record>, StorageError> {
        self.count_write();
        if self.working.get(entity, id).is_none() {
            return Ok(None);
        }
        if let Some((source, column)) = self.working.referenced_by(entity, id) {
            return Err(StorageError::Constraint(format!(
                "{} row {} is still referenced from {}.{}",
                entity, id, source, column
            )));
        }

        Ok(self.working.rows.get_mut(&entity).and_then(|rows| rows.remove(&id)))
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemorySession { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}
