use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::database::Record;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::EntityKind;
use crate::pipeline::OperationOutcome;

/// Resolve the `:entity` path segment
pub fn parse_entity(segment: &str) -> Result<EntityKind, ApiError> {
    segment
        .parse::<EntityKind>()
        .map_err(|e| ApiError::not_found(format!("Unknown resource: {}", e.0)))
}

/// Resolve the `:id` path segment; ids are positive integers
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid record id '{}'", raw)))
}

/// Parse a request body; an empty body counts as `{}`
pub fn parse_body(bytes: &Bytes) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

/// Translate a pipeline outcome into the HTTP response
pub fn outcome_response(outcome: OperationOutcome, entity: EntityKind, legacy_not_found: bool) -> ApiResult<Value> {
    match outcome {
        OperationOutcome::Success(record) => Ok(ApiResponse::success(record.to_api_output())),
        OperationOutcome::SuccessList(records) => Ok(ApiResponse::success(Record::to_api_output_array(records))),
        OperationOutcome::NotFound => Err(ApiError::missing_record(
            format!("{} not found", entity.label()),
            legacy_not_found,
        )),
        OperationOutcome::Unauthorized(reason) => Err(ApiError::unauthorized(format!("Unauthorized: {}", reason))),
        OperationOutcome::ValidationFailed(failures) => Err(ApiError::validation_error(
            format!("Invalid {} data", entity.label().to_lowercase()),
            failures,
        )),
        OperationOutcome::StorageError(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert_eq!(parse_id("0").unwrap_err().status_code(), 400);
        assert_eq!(parse_id("abc").unwrap_err().status_code(), 400);
    }

    #[test]
    fn unknown_entity_is_not_found() {
        assert_eq!(parse_entity("assets").unwrap(), EntityKind::Assets);
        assert_eq!(parse_entity("widgets").unwrap_err().status_code(), 404);
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")).unwrap(), Value::Object(Map::new()));
        let err = parse_body(&Bytes::from_static(b"{\"first_name\":")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
    }
}
