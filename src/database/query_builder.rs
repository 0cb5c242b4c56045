use chrono::NaiveDate;
use sqlx::postgres::PgArguments;

use crate::database::manager::DatabaseManager;
use crate::database::StorageError;
use crate::models::EntityKind;
use crate::validation::{FieldKind, FieldSet, FieldValue};

/// SQL text plus positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub query: String,
    pub params: Vec<FieldValue>,
}

/// Builds the statements the Postgres session runs. Every statement yields
/// rows as a single `row` JSON column so they can be shaped into Records.
pub struct QueryBuilder {
    entity: EntityKind,
}

impl QueryBuilder {
    pub fn new(entity: EntityKind) -> Self {
        Self { entity }
    }

    fn table(&self) -> String {
        DatabaseManager::quote_identifier(self.entity.table_name())
    }

    pub fn select_all(&self) -> SqlStatement {
        SqlStatement {
            query: format!(
                "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} ORDER BY \"id\") t",
                self.table()
            ),
            params: vec![],
        }
    }

    pub fn select_by_id(&self, id: i64, lock: bool) -> SqlStatement {
        let lock_clause = if lock { " FOR UPDATE" } else { "" };
        SqlStatement {
            query: format!(
                "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE \"id\" = $1{}) t",
                self.table(),
                lock_clause
            ),
            params: vec![FieldValue::Integer(id)],
        }
    }

    pub fn insert(&self, fields: &FieldSet) -> SqlStatement {
        if fields.is_empty() {
            return SqlStatement {
                query: format!(
                    "WITH t AS (INSERT INTO {} DEFAULT VALUES RETURNING *) SELECT row_to_json(t) AS row FROM t",
                    self.table()
                ),
                params: vec![],
            };
        }

        let mut columns = Vec::with_capacity(fields.len());
        let mut placeholders = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len());
        for (i, (name, value)) in fields.iter().enumerate() {
            columns.push(DatabaseManager::quote_identifier(name));
            placeholders.push(format!("${}", i + 1));
            params.push(value.clone());
        }

        SqlStatement {
            query: format!(
                "WITH t AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) SELECT row_to_json(t) AS row FROM t",
                self.table(),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        }
    }

    pub fn update(&self, id: i64, fields: &FieldSet) -> Result<SqlStatement, StorageError> {
        if fields.is_empty() {
            return Err(StorageError::Query(format!(
                "update of {} {} has no columns",
                self.entity, id
            )));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len() + 1);
        for (i, (name, value)) in fields.iter().enumerate() {
            assignments.push(format!("{} = ${}", DatabaseManager::quote_identifier(name), i + 1));
            params.push(value.clone());
        }
        params.push(FieldValue::Integer(id));

        Ok(SqlStatement {
            query: format!(
                "WITH t AS (UPDATE {} SET {} WHERE \"id\" = ${} RETURNING *) SELECT row_to_json(t) AS row FROM t",
                self.table(),
                assignments.join(", "),
                params.len()
            ),
            params,
        })
    }

    pub fn delete(&self, id: i64) -> SqlStatement {
        SqlStatement {
            query: format!(
                "WITH t AS (DELETE FROM {} WHERE \"id\" = $1 RETURNING *) SELECT row_to_json(t) AS row FROM t",
                self.table()
            ),
            params: vec![FieldValue::Integer(id)],
        }
    }
}

/// Bind one parameter. Nulls keep the column type so Postgres can infer it.
pub fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &FieldValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FieldValue::Text(s) => q.bind(s.clone()),
        FieldValue::Integer(i) | FieldValue::Reference(i) => q.bind(*i),
        FieldValue::Date(d) => q.bind(*d),
        FieldValue::Null(FieldKind::Text) => q.bind(None::<String>),
        FieldValue::Null(FieldKind::Integer | FieldKind::Reference(_)) => q.bind(None::<i64>),
        FieldValue::Null(FieldKind::Date) => q.bind(None::<NaiveDate>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_partial, ValidationResult};
    use serde_json::json;

    fn fields(body: serde_json::Value, entity: EntityKind) -> FieldSet {
        match validate_partial(&body, entity.schema()) {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(f) => panic!("invalid test body: {:?}", f),
        }
    }

    #[test]
    fn select_by_id_can_lock() {
        let qb = QueryBuilder::new(EntityKind::Assets);
        assert_eq!(
            qb.select_by_id(4, false).query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"assets\" WHERE \"id\" = $1) t"
        );
        assert!(qb.select_by_id(4, true).query.ends_with("FOR UPDATE) t"));
        assert_eq!(qb.select_by_id(4, true).params, vec![FieldValue::Integer(4)]);
    }

    #[test]
    fn insert_lists_columns_in_schema_order() {
        let set = fields(
            json!({"address": "1 Main St", "department_name": "IT", "building_number": 2}),
            EntityKind::Departments,
        );
        let stmt = QueryBuilder::new(EntityKind::Departments).insert(&set);
        assert_eq!(
            stmt.query,
            "WITH t AS (INSERT INTO \"departments\" (\"department_name\", \"building_number\", \"address\") \
             VALUES ($1, $2, $3) RETURNING *) SELECT row_to_json(t) AS row FROM t"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn update_binds_id_last() {
        let set = fields(json!({"service_description": "Fan replaced"}), EntityKind::ServiceJobs);
        let stmt = QueryBuilder::new(EntityKind::ServiceJobs).update(9, &set).unwrap();
        assert_eq!(
            stmt.query,
            "WITH t AS (UPDATE \"service_jobs\" SET \"service_description\" = $1 WHERE \"id\" = $2 \
             RETURNING *) SELECT row_to_json(t) AS row FROM t"
        );
        assert_eq!(stmt.params.last(), Some(&FieldValue::Integer(9)));
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = QueryBuilder::new(EntityKind::Assets)
            .update(1, &FieldSet::default())
            .unwrap_err();
        assert!(matches!(err, StorageError::Query(_)));
    }
}
