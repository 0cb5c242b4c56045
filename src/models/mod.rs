//! Entity tables exposed by the API and the field schema each one accepts.

pub mod asset;
pub mod department;
pub mod employee;
pub mod manufacturer;
pub mod service_job;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::validation::FieldSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Employees,
    Assets,
    Departments,
    Manufacturers,
    ServiceJobs,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Employees,
        EntityKind::Assets,
        EntityKind::Departments,
        EntityKind::Manufacturers,
        EntityKind::ServiceJobs,
    ];

    /// Route segment and table name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Employees => "employees",
            EntityKind::Assets => "assets",
            EntityKind::Departments => "departments",
            EntityKind::Manufacturers => "manufacturers",
            EntityKind::ServiceJobs => "service_jobs",
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.as_str()
    }

    /// Singular name used in client-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Employees => "Employee",
            EntityKind::Assets => "Asset",
            EntityKind::Departments => "Department",
            EntityKind::Manufacturers => "Manufacturer",
            EntityKind::ServiceJobs => "Service job",
        }
    }

    pub fn schema(&self) -> &'static FieldSchema {
        match self {
            EntityKind::Employees => &employee::SCHEMA,
            EntityKind::Assets => &asset::SCHEMA,
            EntityKind::Departments => &department::SCHEMA,
            EntityKind::Manufacturers => &manufacturer::SCHEMA,
            EntityKind::ServiceJobs => &service_job::SCHEMA,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity '{0}'")]
pub struct UnknownEntity(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEntity(s.to_string()))
    }
}
