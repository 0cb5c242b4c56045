//! The one request path every entity route runs through.
//!
//! Mutations move `Start → Validated → Authorized → Located → Committed`;
//! each step can end the request early with its own outcome. Validation runs
//! before the credential is even looked at, so a malformed body never costs
//! a signature check. Lookup and write share one storage session, and the
//! session is dropped (rolled back) on every early exit after it opens.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{authorize, Authorization, DenialReason, IdentityResolver, PrivilegeLevel, ResolvedIdentity};
use crate::config::PolicyConfig;
use crate::database::{Record, Storage, StorageError};
use crate::models::EntityKind;
use crate::types::Operation;
use crate::validation::{validate, validate_partial, FieldFailure, FieldSet, FieldValue, ValidationResult};

/// Terminal result of one pipeline traversal
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Success(Record),
    SuccessList(Vec<Record>),
    NotFound,
    Unauthorized(DenialReason),
    ValidationFailed(Vec<FieldFailure>),
    StorageError(StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    /// Full replacement of every client field
    Replace(i64),
    /// Only the fields present in the body change
    Patch(i64),
    Delete(i64),
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Mutation::Create => Operation::Create,
            Mutation::Replace(_) | Mutation::Patch(_) => Operation::Update,
            Mutation::Delete(_) => Operation::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MutationRequest<'a> {
    pub entity: EntityKind,
    pub mutation: Mutation,
    /// Raw bearer credential, if the caller sent one
    pub credential: Option<&'a str>,
    /// Ignored for deletes; a missing body counts as `{}`
    pub body: Option<&'a Value>,
}

pub struct EntityPipeline {
    storage: Arc<dyn Storage>,
    resolver: IdentityResolver,
    policy: PolicyConfig,
}

impl EntityPipeline {
    pub fn new(storage: Arc<dyn Storage>, resolver: IdentityResolver, policy: PolicyConfig) -> Self {
        Self {
            storage,
            resolver,
            policy,
        }
    }

    pub async fn mutate(&self, request: MutationRequest<'_>) -> OperationOutcome {
        let MutationRequest {
            entity,
            mutation,
            credential,
            body,
        } = request;
        let operation = mutation.operation();

        let fields = match self.validate_body(entity, mutation, body) {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(failures) => {
                debug!("{} {} rejected: {} invalid field(s)", operation, entity, failures.len());
                return OperationOutcome::ValidationFailed(failures);
            }
        };
        debug!("{} {} validated", operation, entity);

        if let Err(reason) = self.check_access(entity, operation, credential) {
            return OperationOutcome::Unauthorized(reason);
        }
        debug!("{} {} authorized", operation, entity);

        match self.write(entity, mutation, fields).await {
            Ok(Some(record)) => {
                debug!("{} {} {} committed", operation, entity, record.id());
                OperationOutcome::Success(record)
            }
            Ok(None) => OperationOutcome::NotFound,
            Err(e) => storage_failure(format_args!("{} {}", operation, entity), e),
        }
    }

    pub async fn list(&self, entity: EntityKind, credential: Option<&str>) -> OperationOutcome {
        if let Err(reason) = self.check_access(entity, Operation::Select, credential) {
            return OperationOutcome::Unauthorized(reason);
        }

        let result = async {
            let mut session = self.storage.begin().await?;
            let records = session.list(entity).await?;
            session.commit().await?;
            Ok::<_, StorageError>(records)
        }
        .await;

        match result {
            Ok(records) => OperationOutcome::SuccessList(records),
            Err(e) => storage_failure(format_args!("select {}", entity), e),
        }
    }

    pub async fn get(&self, entity: EntityKind, id: i64, credential: Option<&str>) -> OperationOutcome {
        if let Err(reason) = self.check_access(entity, Operation::Select, credential) {
            return OperationOutcome::Unauthorized(reason);
        }

        let result = async {
            let mut session = self.storage.begin().await?;
            let record = session.find(entity, id).await?;
            session.commit().await?;
            Ok::<_, StorageError>(record)
        }
        .await;

        match result {
            Ok(Some(record)) => OperationOutcome::Success(record),
            Ok(None) => OperationOutcome::NotFound,
            Err(e) => storage_failure(format_args!("select {} {}", entity, id), e),
        }
    }

    fn validate_body(&self, entity: EntityKind, mutation: Mutation, body: Option<&Value>) -> ValidationResult {
        let empty = Value::Object(Map::new());
        let raw = body.unwrap_or(&empty);
        let schema = entity.schema();

        match mutation {
            Mutation::Create | Mutation::Replace(_) => validate(raw, schema),
            Mutation::Patch(_) => validate_partial(raw, schema),
            Mutation::Delete(_) => ValidationResult::Valid(FieldSet::default()),
        }
    }

    /// Public operations never touch the credential
    fn check_access(&self, entity: EntityKind, operation: Operation, credential: Option<&str>) -> Result<(), DenialReason> {
        let required = self.policy.required(entity, operation);
        let identity = match required {
            PrivilegeLevel::Public => ResolvedIdentity::Absent,
            PrivilegeLevel::AuthenticatedOnly | PrivilegeLevel::AdminOnly => self.resolver.resolve(credential),
        };

        match authorize(&identity, required) {
            Authorization::Allowed => Ok(()),
            Authorization::Denied(reason) => {
                warn!("{} {} denied: {}", operation, entity, reason);
                Err(reason)
            }
        }
    }

    /// Locate (when targeting a row) and write in one session.
    /// `Ok(None)` means the target row does not exist and nothing was written.
    async fn write(&self, entity: EntityKind, mutation: Mutation, mut fields: FieldSet) -> Result<Option<Record>, StorageError> {
        let mut session = self.storage.begin().await?;

        if let Mutation::Replace(id) | Mutation::Patch(id) | Mutation::Delete(id) = mutation {
            if session.find_for_update(entity, id).await?.is_none() {
                debug!("{} {} not found", entity, id);
                return Ok(None);
            }
        }

        let record = match mutation {
            Mutation::Create => {
                fields.stamp("date", FieldValue::Date(Utc::now().date_naive()));
                Some(session.insert(entity, &fields).await?)
            }
            Mutation::Replace(id) | Mutation::Patch(id) => {
                fields.stamp("date", FieldValue::Date(Utc::now().date_naive()));
                session.update(entity, id, &fields).await?
            }
            Mutation::Delete(id) => session.delete(entity, id).await?,
        };

        if record.is_some() {
            session.commit().await?;
        }
        Ok(record)
    }
}

/// Logs a storage fault once, at a level matching its kind
fn storage_failure(action: std::fmt::Arguments<'_>, err: StorageError) -> OperationOutcome {
    match &err {
        StorageError::Constraint(_) => warn!("{} rejected by storage: {}", action, err),
        StorageError::Unavailable(_) | StorageError::Query(_) => error!("{} failed in storage: {}", action, err),
    }
    OperationOutcome::StorageError(err)
}
