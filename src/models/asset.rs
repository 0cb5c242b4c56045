use crate::validation::{FieldSchema, FieldSpec};

use super::EntityKind;

// An asset is assigned to at most one employee and made by at most one manufacturer
const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("serial_number").required().max_length(100).unique(),
    FieldSpec::text("description").max_length(200),
    FieldSpec::date("date_purchased").required(),
    FieldSpec::reference("employee_id", EntityKind::Employees),
    FieldSpec::reference("manufacturer_id", EntityKind::Manufacturers),
];

pub static SCHEMA: FieldSchema = FieldSchema::new(FIELDS);
