use axum::{
    body::Body,
    http::{HeaderValue, Request},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::auth::{IdentityResolver, JwtVerifier};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Storage;
use crate::handlers::{data, system};
use crate::pipeline::EntityPipeline;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EntityPipeline>,
    pub storage: Arc<dyn Storage>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Self {
        let verifier = JwtVerifier::new(config.security.jwt_secret.clone());
        let resolver = IdentityResolver::new(Arc::new(verifier));
        let pipeline = EntityPipeline::new(storage.clone(), resolver, config.policy.clone());

        Self {
            pipeline: Arc::new(pipeline),
            storage,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Entity tables; access is decided per operation by the pipeline
        .merge(data_routes())
        .with_state(state);

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
    } else {
        router
    }
}

fn data_routes() -> Router<AppState> {
    Router::new()
        // Table-level operations (collection)
        .route("/:entity", get(data::schema_get).post(data::schema_post))
        // Record-level operations (individual)
        .route(
            "/:entity/:id",
            get(data::record_get)
                .put(data::record_put)
                .patch(data::record_patch)
                .delete(data::record_delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
