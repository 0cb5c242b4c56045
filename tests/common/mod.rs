#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use asset_tracker::app::{app, AppState};
use asset_tracker::auth::{generate_jwt, Claims};
use asset_tracker::config::AppConfig;
use asset_tracker::database::{MemoryStorage, Storage};

pub const SECRET: &str = "integration-test-secret";

/// Development defaults on the in-memory store with a known signing secret
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = None;
    config.security.jwt_secret = SECRET.to_string();
    config.api.enable_request_logging = false;
    config
}

pub fn admin_token() -> String {
    let claims = Claims::new("1", true, 1).expect("admin claims");
    generate_jwt(&claims, SECRET).expect("admin token")
}

pub fn user_token() -> String {
    let claims = Claims::new("2", false, 1).expect("user claims");
    generate_jwt(&claims, SECRET).expect("user token")
}

pub fn employee_body() -> Value {
    json!({
        "first_name": "A",
        "last_name": "B",
        "email_address": "a@b.com",
        "contact_number": 5551234,
        "position": "Tech"
    })
}

pub fn department_body() -> Value {
    json!({
        "department_name": "Facilities",
        "building_number": 12,
        "address": "12 Station Road"
    })
}

/// Router plus a handle on its store for assertions
pub fn test_app(config: AppConfig) -> (Router, MemoryStorage) {
    let store = MemoryStorage::new();
    let storage: Arc<dyn Storage> = Arc::new(store.clone());
    (app(AppState::new(config, storage)), store)
}

/// Send one request through the router and decode the JSON response
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = serde_json::from_slice(&bytes)?;
    Ok((status, body))
}
