pub mod gate;
pub mod identity;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub use gate::{authorize, Authorization, DenialReason, PrivilegeLevel};
pub use identity::{CredentialError, CredentialVerifier, Identity, IdentityResolver, ResolvedIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id of the caller
    pub sub: String,
    /// Administrator flag; grants AdminOnly operations
    #[serde(default)]
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(principal: impl Into<String>, admin: bool, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            sub: principal.into(),
            admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// HS256 verifier backed by a shared secret
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        if self.secret.is_empty() {
            return Err(CredentialError::NotConfigured);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::InvalidSignature => CredentialError::BadSignature,
                _ => CredentialError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let token = generate_jwt(&Claims::new("17", true, 1).unwrap(), SECRET).unwrap();
        let claims = JwtVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(claims.sub, "17");
        assert!(claims.admin);
    }

    #[test]
    fn wrong_secret_is_a_bad_signature() {
        let token = generate_jwt(&Claims::new("17", false, 1).unwrap(), SECRET).unwrap();
        let err = JwtVerifier::new("another-secret").verify(&token).unwrap_err();
        assert!(matches!(err, CredentialError::BadSignature), "{:?}", err);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut claims = Claims::new("17", true, 1).unwrap();
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_jwt(&claims, SECRET).unwrap();
        let err = JwtVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, CredentialError::Expired), "{:?}", err);
    }

    #[test]
    fn empty_secret_never_issues_or_verifies() {
        assert!(matches!(
            generate_jwt(&Claims::new("1", false, 1).unwrap(), ""),
            Err(JwtError::InvalidSecret)
        ));
        assert!(matches!(
            JwtVerifier::new("").verify("abc.def.ghi"),
            Err(CredentialError::NotConfigured)
        ));
    }

    #[test]
    fn out_of_range_lifetimes_are_rejected() {
        for hours in [10_000_000_000, i64::MAX as u64, u64::MAX] {
            assert!(
                matches!(Claims::new("1", true, hours), Err(JwtError::InvalidExpiry(h)) if h == hours),
                "{} hours should be rejected",
                hours
            );
        }

        let claims = Claims::new("1", true, 24 * 365).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 365 * 3600);
    }
}
