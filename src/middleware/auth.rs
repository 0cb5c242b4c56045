use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Optional bearer credential from the Authorization header.
///
/// Extraction never rejects: a missing header yields `None`, and a header
/// that is not a well-formed bearer token is passed on as-is so that it
/// resolves to an invalid identity instead of an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerCredential(pub Option<String>);

impl BearerCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerCredential(extract_jwt_from_headers(&parts.headers)))
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(AUTHORIZATION)?;

    let Ok(auth_str) = auth_header.to_str() else {
        tracing::debug!("Authorization header is not valid UTF-8");
        return Some(String::new());
    };

    // Auth scheme names are case-insensitive
    match auth_str.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") => Some(token.trim().to_string()),
        _ => {
            tracing::debug!("Authorization header must use Bearer token format");
            Some(auth_str.to_string())
        }
    }
}
