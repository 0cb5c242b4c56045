use crate::validation::{FieldSchema, FieldSpec};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("department_name").required().max_length(100),
    FieldSpec::integer("building_number").required(),
    FieldSpec::text("address").required().max_length(200),
];

pub static SCHEMA: FieldSchema = FieldSchema::new(FIELDS);
