use crate::validation::{FieldSchema, FieldSpec};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("manufacturer_name").required().max_length(100),
    FieldSpec::integer("manufacturer_contact_number").required(),
    FieldSpec::text("manufacturer_email").required().max_length(100),
    FieldSpec::text("manufacturer_address").required().max_length(200),
];

pub static SCHEMA: FieldSchema = FieldSchema::new(FIELDS);
