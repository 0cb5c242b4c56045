use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::models::EntityKind;
use crate::validation::{FieldSet, DATE_FORMAT};

/// Errors that can occur while shaping a stored row into a Record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Expected a JSON object for a {0} row")]
    NotAnObject(EntityKind),
    #[error("Row in {0} has no integer id")]
    MissingId(EntityKind),
}

/// Snapshot of one persisted row: server fields plus every schema column
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: EntityKind,
    id: i64,
    fields: Map<String, Value>,
}

impl Record {
    /// Shape a `row_to_json` result (or an in-memory row) into a Record
    pub fn from_row(entity: EntityKind, row: Value) -> Result<Self, RecordError> {
        let fields = match row {
            Value::Object(map) => map,
            _ => return Err(RecordError::NotAnObject(entity)),
        };
        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(RecordError::MissingId(entity))?;

        Ok(Self { entity, id, fields })
    }

    /// Build a new row from validated fields; absent schema columns are null
    pub fn from_fields(entity: EntityKind, id: i64, values: &FieldSet) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id));
        for spec in entity.schema().fields {
            fields.insert(spec.name.to_string(), Value::Null);
        }

        let mut record = Self { entity, id, fields };
        record.apply(values);
        record
    }

    /// Overwrite the columns present in `values`
    pub fn apply(&mut self, values: &FieldSet) -> &mut Self {
        for (name, value) in values.iter() {
            self.fields.insert(name.to_string(), value.to_json());
        }
        self
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Server-stamped date of the last write
    pub fn date(&self) -> Option<NaiveDate> {
        self.get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
    }

    /// Convert to API output format
    pub fn to_api_output(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Convert an array of records to API output format
    pub fn to_api_output_array(records: Vec<Record>) -> Value {
        Value::Array(records.iter().map(Record::to_api_output).collect())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate, ValidationResult};
    use serde_json::json;

    #[test]
    fn from_row_requires_integer_id() {
        let err = Record::from_row(EntityKind::Departments, json!({"id": "7"})).unwrap_err();
        assert!(matches!(err, RecordError::MissingId(EntityKind::Departments)));

        let err = Record::from_row(EntityKind::Departments, json!([1, 2])).unwrap_err();
        assert!(matches!(err, RecordError::NotAnObject(_)));
    }

    #[test]
    fn from_fields_fills_every_column() {
        let body = json!({"department_name": "IT", "building_number": 4, "address": "1 Main St"});
        let ValidationResult::Valid(fields) = validate(&body, EntityKind::Departments.schema()) else {
            panic!("department body should validate");
        };
        let record = Record::from_fields(EntityKind::Departments, 3, &fields);

        assert_eq!(record.id(), 3);
        assert_eq!(
            record.to_api_output(),
            json!({"id": 3, "department_name": "IT", "building_number": 4, "address": "1 Main St"})
        );
    }

    #[test]
    fn reads_stamped_date() {
        let record = Record::from_row(EntityKind::Assets, json!({"id": 1, "date": "2026-10-18"})).unwrap();
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2026, 10, 18));
    }
}
