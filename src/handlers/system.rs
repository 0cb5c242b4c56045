use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::models::EntityKind;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    let endpoints: serde_json::Map<String, Value> = EntityKind::ALL
        .into_iter()
        .map(|entity| {
            (
                entity.as_str().to_string(),
                json!(format!("/{0}, /{0}/:id", entity.as_str())),
            )
        })
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Asset Tracker API",
            "version": version,
            "description": "Employees, assets, departments, manufacturers and service jobs",
            "storage": state.storage.backend(),
            "endpoints": endpoints,
        }
    }))
}

/// GET /health - storage ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.storage.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": state.storage.backend()
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": state.storage.backend()
                    }
                })),
            )
        }
    }
}
