use std::sync::Arc;

use super::Claims;

/// Verified caller of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub principal: String,
    pub privileged: bool,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            principal: claims.sub,
            privileged: claims.admin,
        }
    }
}

/// What a bearer credential resolved to. Absence is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedIdentity {
    Identity(Identity),
    Absent,
    Invalid(CredentialError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("credential verification is not configured")]
    NotConfigured,
    #[error("credential has expired")]
    Expired,
    #[error("credential signature does not match")]
    BadSignature,
    #[error("malformed credential: {0}")]
    Malformed(String),
}

/// Checks a bearer token and yields its claims
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, CredentialError>;
}

#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn CredentialVerifier>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    pub fn resolve(&self, credential: Option<&str>) -> ResolvedIdentity {
        let Some(token) = credential else {
            return ResolvedIdentity::Absent;
        };

        match self.verifier.verify(token) {
            Ok(claims) => ResolvedIdentity::Identity(claims.into()),
            Err(e) => {
                tracing::debug!("Rejected bearer credential: {}", e);
                ResolvedIdentity::Invalid(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, JwtVerifier};

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(JwtVerifier::new("resolver-secret")))
    }

    #[test]
    fn missing_credential_is_absent() {
        assert_eq!(resolver().resolve(None), ResolvedIdentity::Absent);
    }

    #[test]
    fn garbage_credential_is_invalid() {
        assert!(matches!(
            resolver().resolve(Some("not-a-token")),
            ResolvedIdentity::Invalid(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn verified_claims_become_identity() {
        let token = generate_jwt(&Claims::new("42", false, 1).unwrap(), "resolver-secret").unwrap();
        assert_eq!(
            resolver().resolve(Some(&token)),
            ResolvedIdentity::Identity(Identity {
                principal: "42".to_string(),
                privileged: false,
            })
        );
    }
}
