use axum::{
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;

use super::utils::{outcome_response, parse_body, parse_entity, parse_id};
use crate::app::AppState;
use crate::middleware::{ApiResult, BearerCredential};
use crate::pipeline::{Mutation, MutationRequest};

/// GET /:entity/:id - show single record by id
pub async fn get(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    credential: BearerCredential,
) -> ApiResult<Value> {
    let entity = parse_entity(&entity)?;
    let id = parse_id(&id)?;
    let outcome = state.pipeline.get(entity, id, credential.as_deref()).await;
    outcome_response(outcome, entity, state.config.api.legacy_not_found_status)
}

/// PUT /:entity/:id - replace every client field
pub async fn put(
    state: State<AppState>,
    path: Path<(String, String)>,
    credential: BearerCredential,
    body: Bytes,
) -> ApiResult<Value> {
    update(state, path, credential, body, Mutation::Replace).await
}

/// PATCH /:entity/:id - change only the fields sent
pub async fn patch(
    state: State<AppState>,
    path: Path<(String, String)>,
    credential: BearerCredential,
    body: Bytes,
) -> ApiResult<Value> {
    update(state, path, credential, body, Mutation::Patch).await
}

/// DELETE /:entity/:id - remove a record and return it
pub async fn delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    credential: BearerCredential,
) -> ApiResult<Value> {
    let entity = parse_entity(&entity)?;
    let id = parse_id(&id)?;

    let outcome = state
        .pipeline
        .mutate(MutationRequest {
            entity,
            mutation: Mutation::Delete(id),
            credential: credential.as_deref(),
            body: None,
        })
        .await;
    outcome_response(outcome, entity, state.config.api.legacy_not_found_status)
}

async fn update(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    credential: BearerCredential,
    body: Bytes,
    mutation: fn(i64) -> Mutation,
) -> ApiResult<Value> {
    let entity = parse_entity(&entity)?;
    let id = parse_id(&id)?;
    let body = parse_body(&body)?;

    let outcome = state
        .pipeline
        .mutate(MutationRequest {
            entity,
            mutation: mutation(id),
            credential: credential.as_deref(),
            body: Some(&body),
        })
        .await;
    outcome_response(outcome, entity, state.config.api.legacy_not_found_status)
}
