use axum::{
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;

use super::utils::{outcome_response, parse_body, parse_entity};
use crate::app::AppState;
use crate::middleware::{ApiResult, BearerCredential};
use crate::pipeline::{Mutation, MutationRequest};

/// GET /:entity - list every row
pub async fn get(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    credential: BearerCredential,
) -> ApiResult<Value> {
    let entity = parse_entity(&entity)?;
    let outcome = state.pipeline.list(entity, credential.as_deref()).await;
    outcome_response(outcome, entity, state.config.api.legacy_not_found_status)
}

/// POST /:entity - create one row
pub async fn post(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    credential: BearerCredential,
    body: Bytes,
) -> ApiResult<Value> {
    let entity = parse_entity(&entity)?;
    let body = parse_body(&body)?;

    let outcome = state
        .pipeline
        .mutate(MutationRequest {
            entity,
            mutation: Mutation::Create,
            credential: credential.as_deref(),
            body: Some(&body),
        })
        .await;
    outcome_response(outcome, entity, state.config.api.legacy_not_found_status)
}
