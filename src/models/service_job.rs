use crate::validation::{FieldSchema, FieldSpec};

use super::EntityKind;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("service_description").required().max_length(200),
    FieldSpec::date("service_date").required(),
    FieldSpec::reference("asset_id", EntityKind::Assets).required(),
];

pub static SCHEMA: FieldSchema = FieldSchema::new(FIELDS);
