//! Request payload validation against per-entity field schemas.
//!
//! A raw body is checked field by field against a [`FieldSchema`]. Every
//! problem is collected before returning so a client sees all of them at
//! once. Fields the schema does not know about are dropped, and so are the
//! server-generated fields (`id`, `date`) even when a client sends them.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::EntityKind;

/// Field names that only the server may set
pub const SERVER_FIELDS: &[&str] = &["id", "date"];

/// Date format accepted on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Primitive kind expected for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Date,
    /// Primary key of a row in another entity table
    Reference(EntityKind),
}

/// Declaration of one column accepted from API input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<usize>,
    /// Enforced by storage, never by the validator
    pub unique: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            max_length: None,
            unique: false,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub const fn reference(name: &'static str, target: EntityKind) -> Self {
        Self::new(name, FieldKind::Reference(target))
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// The set of fields a route accepts
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub fields: &'static [FieldSpec],
}

impl FieldSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|spec| spec.unique)
    }

    pub fn references(&self) -> impl Iterator<Item = (&FieldSpec, EntityKind)> {
        self.fields.iter().filter_map(|spec| match spec.kind {
            FieldKind::Reference(target) => Some((spec, target)),
            _ => None,
        })
    }
}

/// A typed, validated value ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Reference(i64),
    /// Explicit null; keeps the kind so storage can bind a typed NULL
    Null(FieldKind),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) | FieldValue::Reference(i) => Value::from(*i),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::Null(_) => Value::Null,
        }
    }
}

/// Validated fields in schema declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    values: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set a server-generated field, replacing any previous value
    pub fn stamp(&mut self, name: &'static str, value: FieldValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.values.push((name, value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Required,
    InvalidType,
    TooLong,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Required => "required",
            FailureReason::InvalidType => "invalid_type",
            FailureReason::TooLong => "too_long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub reason: FailureReason,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(FieldSet),
    Invalid(Vec<FieldFailure>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Every required field must be present; absent optional fields become null
    Full,
    /// Only the fields present are checked and returned
    Partial,
}

/// Validate a complete body (create, full replacement)
pub fn validate(raw: &Value, schema: &FieldSchema) -> ValidationResult {
    validate_with(raw, schema, Mode::Full)
}

/// Validate a partial body (patch); absent fields are left untouched
pub fn validate_partial(raw: &Value, schema: &FieldSchema) -> ValidationResult {
    validate_with(raw, schema, Mode::Partial)
}

fn validate_with(raw: &Value, schema: &FieldSchema, mode: Mode) -> ValidationResult {
    let body = match raw {
        Value::Object(map) => map,
        _ => return ValidationResult::Invalid(vec![FieldFailure::new("body", FailureReason::InvalidType)]),
    };

    log_ignored_fields(body, schema);

    let mut fields = FieldSet::default();
    let mut failures = Vec::new();

    for spec in schema.fields {
        if SERVER_FIELDS.contains(&spec.name) {
            continue;
        }

        match (body.get(spec.name), mode) {
            (None, Mode::Partial) => {}
            (None | Some(Value::Null), _) if spec.required => {
                failures.push(FieldFailure::new(spec.name, FailureReason::Required));
            }
            (None | Some(Value::Null), _) => fields.push(spec.name, FieldValue::Null(spec.kind)),
            (Some(value), _) => match check_value(spec, value) {
                Ok(v) => fields.push(spec.name, v),
                Err(reason) => failures.push(FieldFailure::new(spec.name, reason)),
            },
        }
    }

    if failures.is_empty() {
        ValidationResult::Valid(fields)
    } else {
        ValidationResult::Invalid(failures)
    }
}

fn check_value(spec: &FieldSpec, value: &Value) -> Result<FieldValue, FailureReason> {
    match spec.kind {
        FieldKind::Text => {
            let s = value.as_str().ok_or(FailureReason::InvalidType)?;
            if let Some(max) = spec.max_length {
                if s.chars().count() > max {
                    return Err(FailureReason::TooLong);
                }
            }
            Ok(FieldValue::Text(s.to_string()))
        }
        FieldKind::Integer => value
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or(FailureReason::InvalidType),
        FieldKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .map(FieldValue::Date)
            .ok_or(FailureReason::InvalidType),
        FieldKind::Reference(_) => value
            .as_i64()
            .filter(|id| *id > 0)
            .map(FieldValue::Reference)
            .ok_or(FailureReason::InvalidType),
    }
}

fn log_ignored_fields(body: &Map<String, Value>, schema: &FieldSchema) {
    for key in body.keys() {
        if SERVER_FIELDS.contains(&key.as_str()) {
            tracing::debug!("Dropping server-generated field '{}' from request body", key);
        } else if schema.field(key).is_none() {
            tracing::debug!("Ignoring unknown field '{}'", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::text("name").required().max_length(5),
        FieldSpec::integer("count").required(),
        FieldSpec::date("when"),
        FieldSpec::reference("owner_id", EntityKind::Employees),
    ];
    const SCHEMA: FieldSchema = FieldSchema::new(FIELDS);

    fn failures(result: ValidationResult) -> Vec<(String, &'static str)> {
        match result {
            ValidationResult::Invalid(f) => f.into_iter().map(|f| (f.field, f.reason.as_str())).collect(),
            ValidationResult::Valid(fields) => panic!("expected failures, got {:?}", fields),
        }
    }

    fn valid(result: ValidationResult) -> FieldSet {
        match result {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(f) => panic!("expected valid body, got {:?}", f),
        }
    }

    #[test]
    fn accepts_well_formed_body() {
        let fields = valid(validate(
            &json!({"name": "abc", "count": 3, "when": "2024-02-29", "owner_id": 7}),
            &SCHEMA,
        ));
        assert_eq!(fields.get("name"), Some(&FieldValue::Text("abc".into())));
        assert_eq!(fields.get("count"), Some(&FieldValue::Integer(3)));
        assert_eq!(
            fields.get("when"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(fields.get("owner_id"), Some(&FieldValue::Reference(7)));
    }

    #[test]
    fn collects_every_failure_in_schema_order() {
        let result = validate(&json!({"count": "three", "when": "29/02/2024", "owner_id": 0}), &SCHEMA);
        assert_eq!(
            failures(result),
            vec![
                ("name".to_string(), "required"),
                ("count".to_string(), "invalid_type"),
                ("when".to_string(), "invalid_type"),
                ("owner_id".to_string(), "invalid_type"),
            ]
        );
    }

    #[test]
    fn null_counts_as_missing_for_required_fields() {
        let result = validate(&json!({"name": null, "count": 1}), &SCHEMA);
        assert_eq!(failures(result), vec![("name".to_string(), "required")]);
    }

    #[test]
    fn absent_optional_fields_become_typed_nulls() {
        let fields = valid(validate(&json!({"name": "a", "count": 1}), &SCHEMA));
        assert_eq!(fields.get("when"), Some(&FieldValue::Null(FieldKind::Date)));
        assert_eq!(
            fields.get("owner_id"),
            Some(&FieldValue::Null(FieldKind::Reference(EntityKind::Employees)))
        );
    }

    #[test]
    fn rejects_strings_over_max_length() {
        let result = validate(&json!({"name": "abcdef", "count": 1}), &SCHEMA);
        assert_eq!(failures(result), vec![("name".to_string(), "too_long")]);
    }

    #[test]
    fn fractional_numbers_are_not_integers() {
        let result = validate(&json!({"name": "a", "count": 1.5}), &SCHEMA);
        assert_eq!(failures(result), vec![("count".to_string(), "invalid_type")]);
    }

    #[test]
    fn strips_server_generated_and_unknown_fields() {
        let fields = valid(validate(
            &json!({"id": 99, "date": "2001-01-01", "name": "a", "count": 1, "colour": "red"}),
            &SCHEMA,
        ));
        assert!(!fields.contains("id"));
        assert!(!fields.contains("date"));
        assert!(!fields.contains("colour"));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn non_object_body_is_a_single_failure() {
        let result = validate(&json!(["name", "count"]), &SCHEMA);
        assert_eq!(failures(result), vec![("body".to_string(), "invalid_type")]);
    }

    #[test]
    fn partial_mode_only_checks_present_fields() {
        let fields = valid(validate_partial(&json!({"count": 4}), &SCHEMA));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("count"), Some(&FieldValue::Integer(4)));

        let result = validate_partial(&json!({"name": null}), &SCHEMA);
        assert_eq!(failures(result), vec![("name".to_string(), "required")]);
    }

    #[test]
    fn stamp_replaces_existing_value() {
        let mut fields = FieldSet::default();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        fields.stamp("date", FieldValue::Date(day));
        fields.stamp("date", FieldValue::Date(day.succ_opt().unwrap()));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("date").map(FieldValue::to_json), Some(json!("2020-01-02")));
    }
}
