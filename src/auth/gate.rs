use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::identity::ResolvedIdentity;

/// Minimum caller capability an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    Public,
    AuthenticatedOnly,
    AdminOnly,
}

impl FromStr for PrivilegeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PrivilegeLevel::Public),
            "authenticated" | "authenticated_only" => Ok(PrivilegeLevel::AuthenticatedOnly),
            "admin" | "admin_only" => Ok(PrivilegeLevel::AdminOnly),
            other => Err(format!("unknown privilege level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NoCredential,
    InsufficientPrivilege,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NoCredential => "no credential",
            DenialReason::InsufficientPrivilege => "insufficient privilege",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(DenialReason),
}

/// The single authorization check shared by every route.
///
/// An invalid credential is treated exactly like a missing one.
pub fn authorize(identity: &ResolvedIdentity, required: PrivilegeLevel) -> Authorization {
    let caller = match identity {
        ResolvedIdentity::Identity(caller) => Some(caller),
        ResolvedIdentity::Absent | ResolvedIdentity::Invalid(_) => None,
    };

    match (required, caller) {
        (PrivilegeLevel::Public, _) => Authorization::Allowed,
        (_, None) => Authorization::Denied(DenialReason::NoCredential),
        (PrivilegeLevel::AuthenticatedOnly, Some(_)) => Authorization::Allowed,
        (PrivilegeLevel::AdminOnly, Some(caller)) if caller.privileged => Authorization::Allowed,
        (PrivilegeLevel::AdminOnly, Some(_)) => Authorization::Denied(DenialReason::InsufficientPrivilege),
    }
}
