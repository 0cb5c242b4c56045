use crate::validation::{FieldSchema, FieldSpec};

use super::EntityKind;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("first_name").required().max_length(20),
    FieldSpec::text("last_name").required().max_length(20),
    FieldSpec::text("email_address").required().max_length(100).unique(),
    FieldSpec::integer("contact_number").required().unique(),
    FieldSpec::text("position").required().max_length(100),
    FieldSpec::reference("department_id", EntityKind::Departments),
];

pub static SCHEMA: FieldSchema = FieldSchema::new(FIELDS);
