use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

use crate::auth::gate::PrivilegeLevel;
use crate::models::EntityKind;
use crate::types::Operation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; when absent the service runs on the in-process store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Answer missing records with 400 instead of 404 (legacy clients expect 400)
    pub legacy_not_found_status: bool,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Required privilege per entity and operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub default_read: PrivilegeLevel,
    pub default_write: PrivilegeLevel,
    pub overrides: HashMap<(EntityKind, Operation), PrivilegeLevel>,
}

impl PolicyConfig {
    pub fn new(default_read: PrivilegeLevel, default_write: PrivilegeLevel) -> Self {
        Self {
            default_read,
            default_write,
            overrides: HashMap::new(),
        }
    }

    /// Privilege level required to run `operation` against `entity`
    pub fn required(&self, entity: EntityKind, operation: Operation) -> PrivilegeLevel {
        if let Some(level) = self.overrides.get(&(entity, operation)) {
            return *level;
        }
        match operation {
            Operation::Select => self.default_read,
            Operation::Create | Operation::Update | Operation::Delete => self.default_write,
        }
    }

    pub fn with_override(
        mut self,
        entity: EntityKind,
        operation: Operation,
        level: PrivilegeLevel,
    ) -> Self {
        self.overrides.insert((entity, operation), level);
        self
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(v) = env::var("API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_LEGACY_NOT_FOUND_STATUS") {
            self.api.legacy_not_found_status = v.parse().unwrap_or(self.api.legacy_not_found_status);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Policy overrides: POLICY_<ENTITY>_<OPERATION>=public|authenticated|admin
        for entity in EntityKind::ALL {
            for operation in Operation::ALL {
                let key = format!(
                    "POLICY_{}_{}",
                    entity.as_str().to_ascii_uppercase(),
                    operation.as_str().to_ascii_uppercase()
                );
                if let Ok(v) = env::var(&key) {
                    match v.parse::<PrivilegeLevel>() {
                        Ok(level) => {
                            self.policy.overrides.insert((entity, operation), level);
                        }
                        Err(_) => tracing::warn!("Ignoring {}: unknown privilege level '{}'", key, v),
                    }
                }
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                legacy_not_found_status: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            policy: PolicyConfig::new(PrivilegeLevel::Public, PrivilegeLevel::AdminOnly),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                legacy_not_found_status: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            policy: PolicyConfig::new(PrivilegeLevel::Public, PrivilegeLevel::AdminOnly),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                legacy_not_found_status: true,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            policy: PolicyConfig::new(PrivilegeLevel::Public, PrivilegeLevel::AdminOnly),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.url.is_none());
        assert!(config.api.legacy_not_found_status);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.run_migrations);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn test_policy_defaults_public_reads_admin_writes() {
        let policy = AppConfig::development().policy;
        assert_eq!(policy.required(EntityKind::Employees, Operation::Select), PrivilegeLevel::Public);
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert_eq!(policy.required(EntityKind::Assets, op), PrivilegeLevel::AdminOnly);
        }
    }

    #[test]
    fn test_policy_override_applies_to_one_entity() {
        let policy = PolicyConfig::new(PrivilegeLevel::Public, PrivilegeLevel::AdminOnly).with_override(
            EntityKind::ServiceJobs,
            Operation::Select,
            PrivilegeLevel::AuthenticatedOnly,
        );
        assert_eq!(
            policy.required(EntityKind::ServiceJobs, Operation::Select),
            PrivilegeLevel::AuthenticatedOnly
        );
        assert_eq!(policy.required(EntityKind::Departments, Operation::Select), PrivilegeLevel::Public);
    }
}
